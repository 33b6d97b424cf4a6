//! OSS V1 请求签名
//!
//! Authorization = "OSS " + AccessKeyId + ":" + base64(hmac-sha1(AccessKeySecret, StringToSign))
//!
//! StringToSign = VERB + "\n" + Content-MD5 + "\n" + Content-Type + "\n" + Date + "\n"
//!              + CanonicalizedOSSHeaders + CanonicalizedResource

use crate::error::{OssError, Result};
use crate::transport::OssRequest;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

/// 参与签名的子资源
const SIGNED_SUB_RESOURCES: &[&str] = &["partNumber", "uploadId", "uploads"];

pub struct Signer {
    access_id: String,
    access_secret: String,
}

impl Signer {
    pub fn new(access_id: impl Into<String>, access_secret: impl Into<String>) -> Self {
        Self {
            access_id: access_id.into(),
            access_secret: access_secret.into(),
        }
    }

    /// 以当前时间签名，写入 Date 与 Authorization 头
    pub fn sign(&self, request: &mut OssRequest, bucket: &str) -> Result<()> {
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        self.sign_at(request, bucket, &date)
    }

    pub fn sign_at(&self, request: &mut OssRequest, bucket: &str, date: &str) -> Result<()> {
        request.headers.retain(|(k, _)| {
            !k.eq_ignore_ascii_case("date") && !k.eq_ignore_ascii_case("authorization")
        });
        request.headers.push(("Date".to_string(), date.to_string()));

        let signature = self.signature(&string_to_sign(request, bucket, date))?;
        request.headers.push((
            "Authorization".to_string(),
            format!("OSS {}:{}", self.access_id, signature),
        ));
        Ok(())
    }

    fn signature(&self, string_to_sign: &str) -> Result<String> {
        let mut mac = HmacSha1::new_from_slice(self.access_secret.as_bytes())
            .map_err(|e| OssError::Config(format!("无效的签名密钥: {}", e)))?;
        mac.update(string_to_sign.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("access_id", &self.access_id)
            .field("access_secret", &"<redacted>")
            .finish()
    }
}

pub(crate) fn string_to_sign(request: &OssRequest, bucket: &str, date: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}{}",
        request.method.as_str(),
        request.header_value("content-md5").unwrap_or_default(),
        request.header_value("content-type").unwrap_or_default(),
        date,
        canonicalized_oss_headers(request),
        canonicalized_resource(request, bucket)
    )
}

fn canonicalized_oss_headers(request: &OssRequest) -> String {
    let mut headers: Vec<(String, &str)> = request
        .headers
        .iter()
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim()))
        .filter(|(k, _)| k.starts_with("x-oss-"))
        .collect();
    headers.sort_by(|a, b| a.0.cmp(&b.0));
    headers
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v))
        .collect()
}

fn canonicalized_resource(request: &OssRequest, bucket: &str) -> String {
    let mut resource = format!("/{}/{}", bucket, request.key);

    let mut subs: Vec<&(String, Option<String>)> = request
        .sub_resources
        .iter()
        .filter(|(k, _)| SIGNED_SUB_RESOURCES.contains(&k.as_str()))
        .collect();
    subs.sort_by(|a, b| a.0.cmp(&b.0));

    for (i, (name, value)) in subs.iter().enumerate() {
        resource.push(if i == 0 { '?' } else { '&' });
        resource.push_str(name);
        if let Some(value) = value {
            resource.push('=');
            resource.push_str(value);
        }
    }
    resource
}

//! OSS XML 报文

use crate::error::{OssError, Result};
use quick_xml::{de, se};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(rename = "InitiateMultipartUploadResult", rename_all = "PascalCase")]
pub struct InitiateMultipartUploadResult {
    pub upload_id: String,
}

/// 已上传的分片
#[derive(Clone, Debug, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CompletedPart {
    pub part_number: u32,
    #[serde(rename = "ETag")]
    pub etag: String,
}

#[derive(Clone, Debug, Serialize, Default)]
#[serde(rename = "CompleteMultipartUpload", rename_all = "PascalCase")]
pub struct CompleteMultipartUpload {
    pub part: Vec<CompletedPart>,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(rename = "ListBucketResult", rename_all = "PascalCase")]
pub struct ListBucketResult {
    #[serde(default)]
    pub is_truncated: bool,
    #[serde(default)]
    pub next_marker: Option<String>,
    #[serde(default)]
    pub contents: Vec<ObjectSummary>,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectSummary {
    pub key: String,
    #[serde(default)]
    pub size: u64,
}

impl ListBucketResult {
    /// 下一页的起始标记，优先使用 NextMarker，没有时退回本页最后一个键
    pub fn continuation(&self) -> Option<String> {
        if !self.is_truncated {
            return None;
        }
        self.next_marker
            .clone()
            .filter(|m| !m.is_empty())
            .or_else(|| self.contents.last().map(|o| o.key.clone()))
    }
}

/// OSS 返回的错误报文
#[derive(Clone, Debug, Deserialize, Default)]
#[serde(rename = "Error", rename_all = "PascalCase")]
pub struct OssErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: String,
}

impl OssErrorBody {
    /// 尽力解析错误报文，解析不了时返回原始文本
    pub fn describe(body: &[u8]) -> String {
        match from_xml::<OssErrorBody>(body) {
            Ok(err) if !err.code.is_empty() => format!(
                "{}: {} (request id: {})",
                err.code, err.message, err.request_id
            ),
            _ => String::from_utf8_lossy(body).trim().to_string(),
        }
    }
}

pub fn from_xml<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    de::from_reader(body).map_err(|e| OssError::Xml(e.to_string()))
}

pub fn to_xml<T: Serialize>(value: &T) -> Result<String> {
    se::to_string(value).map_err(|e| OssError::Xml(e.to_string()))
}

//! OSS REST 客户端
//!
//! 每个方法只负责组装、签名并发送一次请求，返回原始响应。
//! 状态码的含义由存储层按各自的语义判断。

use crate::config::OssConfig;
use crate::error::Result;
use crate::models::{CompleteMultipartUpload, CompletedPart, to_xml};
use crate::sign::Signer;
use crate::transport::{HttpTransport, Method, OssRequest, OssResponse, Transport};
use bytes::Bytes;
use registry_driver_core::ByteRange;
use std::sync::Arc;
use tracing::trace;

pub struct OssClient {
    bucket: String,
    signer: Signer,
    transport: Arc<dyn Transport>,
}

impl OssClient {
    pub fn new(config: &OssConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(config)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: &OssConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            bucket: config.bucket().to_string(),
            signer: Signer::new(config.access_id(), config.access_secret()),
            transport,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn send(&self, mut request: OssRequest) -> Result<OssResponse> {
        self.signer.sign(&mut request, &self.bucket)?;
        trace!(
            "OSS 请求: {} /{} ?{}",
            request.method,
            request.key,
            request.query_string()
        );
        self.transport.send(request).await
    }

    pub async fn get_object(&self, key: &str, range: Option<ByteRange>) -> Result<OssResponse> {
        let mut request = OssRequest::new(Method::GET, key);
        if let Some(range) = range {
            request = request.header("Range", range.to_string());
        }
        self.send(request).await
    }

    pub async fn put_object(&self, key: &str, body: Bytes) -> Result<OssResponse> {
        let request = OssRequest::new(Method::PUT, key)
            .header("Content-Type", "application/octet-stream")
            .body(body);
        self.send(request).await
    }

    pub async fn head_object(&self, key: &str) -> Result<OssResponse> {
        self.send(OssRequest::new(Method::HEAD, key)).await
    }

    pub async fn delete_object(&self, key: &str) -> Result<OssResponse> {
        self.send(OssRequest::new(Method::DELETE, key)).await
    }

    /// 列举 bucket 中指定前缀下的对象
    pub async fn list_objects(
        &self,
        prefix: &str,
        marker: Option<&str>,
        max_keys: usize,
    ) -> Result<OssResponse> {
        let mut request = OssRequest::new(Method::GET, "")
            .query("prefix", prefix)
            .query("max-keys", max_keys.to_string());
        if let Some(marker) = marker {
            request = request.query("marker", marker);
        }
        self.send(request).await
    }

    pub async fn initiate_multipart_upload(&self, key: &str) -> Result<OssResponse> {
        let request = OssRequest::new(Method::POST, key)
            .sub_resource("uploads", None)
            .header("Content-Type", "application/octet-stream");
        self.send(request).await
    }

    pub async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<OssResponse> {
        let request = OssRequest::new(Method::PUT, key)
            .sub_resource("partNumber", Some(part_number.to_string()))
            .sub_resource("uploadId", Some(upload_id.to_string()))
            .body(body);
        self.send(request).await
    }

    pub async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<OssResponse> {
        let body = to_xml(&CompleteMultipartUpload {
            part: parts.to_vec(),
        })?;
        let request = OssRequest::new(Method::POST, key)
            .sub_resource("uploadId", Some(upload_id.to_string()))
            .header("Content-Type", "application/xml")
            .body(Bytes::from(body));
        self.send(request).await
    }
}

use crate::client::OssClient;
use crate::config::OssConfig;
use crate::models::{
    CompletedPart, InitiateMultipartUploadResult, ListBucketResult, OssErrorBody, from_xml,
};
use crate::path::resolve;
use crate::transport::{OssResponse, StatusCode, Transport};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use registry_driver_core::{
    ByteRange, ByteStream, ContentReader, DriverError, KeyStream, Result, StorageDriver,
};
use std::io;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, error, info, warn};

/// 单次列举返回的最大条数（OSS 上限）
const LIST_PAGE_SIZE: usize = 1000;

/// 基于阿里云 OSS 的存储驱动
///
/// 只持有不可变配置和客户端句柄，可在并发调用者之间共享。
#[derive(Clone)]
pub struct OssStorage {
    config: Arc<OssConfig>,
    client: Arc<OssClient>,
}

enum ListState {
    Start,
    Next(String),
    Done,
}

impl OssStorage {
    pub fn new(config: OssConfig) -> crate::Result<Self> {
        config.validate()?;
        let client = OssClient::new(&config)?;
        Ok(Self::from_parts(config, client))
    }

    /// 使用自定义传输层构造，主要用于测试
    pub fn with_transport(
        config: OssConfig,
        transport: Arc<dyn Transport>,
    ) -> crate::Result<Self> {
        config.validate()?;
        let client = OssClient::with_transport(&config, transport);
        Ok(Self::from_parts(config, client))
    }

    fn from_parts(config: OssConfig, client: OssClient) -> Self {
        if config.uses_placeholder_credentials() {
            warn!("OSS 仍在使用占位凭证或 bucket，请勿用于生产环境");
        }
        info!(
            "OSS 存储驱动已创建: host={}, bucket={}, root={:?}, buffer_size={}",
            config.host(),
            config.bucket(),
            config.root_path(),
            config.buffer_size()
        );
        Self {
            config: Arc::new(config),
            client: Arc::new(client),
        }
    }

    pub fn config(&self) -> &OssConfig {
        &self.config
    }

    /// 解析出非空的对象键
    fn object_key(&self, path: &str) -> Result<String> {
        let key = resolve(self.config.root_path(), path);
        if key.is_empty() {
            return Err(DriverError::InvalidPath(format!(
                "路径 {:?} 解析后的对象键为空",
                path
            )));
        }
        Ok(key)
    }

    /// 按前缀惰性列举对象键，自动翻页
    fn list_keys(&self, prefix: String) -> KeyStream {
        let this = self.clone();
        stream::try_unfold(ListState::Start, move |state| {
            let this = this.clone();
            let prefix = prefix.clone();
            async move {
                let marker = match state {
                    ListState::Done => return Ok(None),
                    ListState::Start => None,
                    ListState::Next(marker) => Some(marker),
                };
                let page = this.list_page(&prefix, marker.as_deref()).await?;
                let next = match page.continuation() {
                    Some(marker) => ListState::Next(marker),
                    None => ListState::Done,
                };
                let keys = page
                    .contents
                    .into_iter()
                    .map(|object| Ok::<_, DriverError>(object.key));
                Ok::<_, DriverError>(Some((stream::iter(keys), next)))
            }
        })
        .try_flatten()
        .boxed()
    }

    async fn list_page(&self, prefix: &str, marker: Option<&str>) -> Result<ListBucketResult> {
        let resp = self
            .client
            .list_objects(prefix, marker, LIST_PAGE_SIZE)
            .await?;
        match resp.status {
            StatusCode::OK => {
                let body = resp.bytes().await?;
                Ok(from_xml(&body)?)
            }
            StatusCode::NOT_FOUND => Err(DriverError::NotFound(prefix.to_string())),
            _ => Err(failure("列举对象", prefix, resp).await),
        }
    }

    async fn delete_key(&self, key: &str) -> Result<()> {
        let resp = self.client.delete_object(key).await?;
        // 删除不存在的对象在 OSS 上返回 204，这里把 404 也当作成功
        if resp.status.is_success() || resp.status == StatusCode::NOT_FOUND {
            debug!("对象已删除: {}", key);
            Ok(())
        } else {
            Err(failure("删除对象", key, resp).await)
        }
    }

    async fn put_key(&self, key: &str, content: Bytes) -> Result<()> {
        let size = content.len();
        let resp = self.client.put_object(key, content).await?;
        if !resp.status.is_success() {
            return Err(failure("上传对象", key, resp).await);
        }
        debug!("对象已上传: {}, 大小: {} 字节", key, size);
        Ok(())
    }

    async fn initiate_upload(&self, key: &str) -> Result<String> {
        let resp = self.client.initiate_multipart_upload(key).await?;
        if resp.status != StatusCode::OK {
            return Err(failure("初始化分片上传", key, resp).await);
        }
        let body = resp.bytes().await?;
        let result: InitiateMultipartUploadResult = from_xml(&body)?;
        Ok(result.upload_id)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        chunk: Bytes,
    ) -> Result<CompletedPart> {
        let size = chunk.len();
        let resp = self
            .client
            .upload_part(key, upload_id, part_number, chunk)
            .await?;
        if resp.status != StatusCode::OK {
            return Err(failure(&format!("上传分片 {}", part_number), key, resp).await);
        }
        let etag = resp.headers().etag().map(str::to_string).ok_or_else(|| {
            DriverError::Transport(format!("分片 {} 的响应缺少 ETag: {}", part_number, key))
        })?;
        debug!("分片已上传: {} #{}, 大小: {} 字节", key, part_number, size);
        Ok(CompletedPart { part_number, etag })
    }

    async fn complete_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<()> {
        let resp = self
            .client
            .complete_multipart_upload(key, upload_id, parts)
            .await?;
        if resp.status != StatusCode::OK {
            return Err(failure("完成分片上传", key, resp).await);
        }
        Ok(())
    }
}

#[async_trait]
impl StorageDriver for OssStorage {
    fn supports_bytes_range(&self) -> bool {
        true
    }

    fn full_path(&self, path: &str) -> String {
        resolve(self.config.root_path(), path)
    }

    async fn get_content(&self, path: &str) -> Result<Bytes> {
        let key = self.object_key(path)?;
        let resp = match self.client.get_object(&key, None).await {
            Ok(resp) => resp,
            Err(e) => {
                debug!("读取对象失败: {}: {}", key, e);
                return Err(DriverError::NotFound(key));
            }
        };
        if resp.status != StatusCode::OK {
            debug!("读取对象失败: {}: 状态码 {}", key, resp.status);
            return Err(DriverError::NotFound(key));
        }
        match resp.bytes().await {
            Ok(content) => {
                debug!("对象已读取: {}, 大小: {} 字节", key, content.len());
                Ok(content)
            }
            Err(e) => {
                debug!("读取对象内容失败: {}: {}", key, e);
                Err(DriverError::NotFound(key))
            }
        }
    }

    async fn put_content(&self, path: &str, content: Bytes) -> Result<String> {
        let key = self.object_key(path)?;
        self.put_key(&key, content).await?;
        Ok(path.to_string())
    }

    async fn stream_write(&self, path: &str, mut reader: ContentReader) -> Result<()> {
        let key = self.object_key(path)?;
        let buffer_size = self.config.buffer_size();

        let mut chunk = read_chunk(&mut reader, buffer_size)
            .await
            .map_err(|e| stream_io_error(&key, e))?;

        // 空输入不走分片上传，OSS 不接受零分片的完成请求
        if chunk.is_empty() {
            return self.put_key(&key, chunk).await;
        }

        let upload_id = self.initiate_upload(&key).await?;
        debug!("分片上传已初始化: {}, upload_id={}", key, upload_id);

        let mut parts = Vec::new();
        let mut part_number: u32 = 1;
        loop {
            parts.push(self.upload_part(&key, &upload_id, part_number, chunk).await?);

            chunk = read_chunk(&mut reader, buffer_size)
                .await
                .map_err(|e| stream_io_error(&key, e))?;
            if chunk.is_empty() {
                break;
            }
            part_number += 1;
        }

        self.complete_upload(&key, &upload_id, &parts).await?;
        info!("分片上传完成: {}, 共 {} 个分片", key, parts.len());
        Ok(())
    }

    async fn stream_read(&self, path: &str, range: Option<ByteRange>) -> Result<ByteStream> {
        let key = self.object_key(path)?;
        if !self.exists(path).await? {
            return Err(DriverError::NotFound(key));
        }

        let resp = self.client.get_object(&key, range).await?;
        if resp.status != StatusCode::OK && resp.status != StatusCode::PARTIAL_CONTENT {
            return Err(failure("打开对象", &key, resp).await);
        }

        let reader = StreamReader::new(resp.body);
        let chunks = ReaderStream::with_capacity(reader, self.config.buffer_size())
            .map_err(move |e| DriverError::Transport(format!("读取对象 {} 失败: {}", key, e)));
        Ok(chunks.boxed())
    }

    async fn list_directory(&self, path: Option<&str>) -> Result<KeyStream> {
        let prefix = match path {
            Some(path) => self.full_path(path),
            None => match self.config.root_path() {
                "" => String::new(),
                root => format!("{}/", root),
            },
        };
        debug!("列举目录: {:?}", prefix);
        Ok(self.list_keys(prefix))
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let key = self.object_key(path)?;

        let mut children = self.list_keys(format!("{}/", key));
        let mut removed = 0usize;
        while let Some(child) = children.next().await {
            match child {
                Ok(child) => {
                    self.delete_key(&child).await?;
                    removed += 1;
                }
                Err(DriverError::NotFound(prefix)) => {
                    warn!("列举待删除对象时未找到: {}", prefix);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        self.delete_key(&key).await?;
        info!("路径已删除: {}, 子对象 {} 个", key, removed);
        Ok(())
    }

    async fn get_size(&self, path: &str) -> Result<u64> {
        let key = self.object_key(path)?;
        let resp = self.client.head_object(&key).await?;
        if !resp.status.is_success() {
            return Err(DriverError::NotFound(key));
        }
        let size = resp.headers().content_length().ok_or_else(|| {
            DriverError::MissingMetadata(format!("{} 的响应缺少 Content-Length", key))
        })?;
        debug!("对象大小: {} = {}", key, size);
        Ok(size)
    }
}

/// 从输入流读满一个分片，返回空块表示流已结束
async fn read_chunk(reader: &mut ContentReader, size: usize) -> io::Result<Bytes> {
    let mut buf = Vec::with_capacity(size);
    reader.take(size as u64).read_to_end(&mut buf).await?;
    Ok(Bytes::from(buf))
}

fn stream_io_error(key: &str, err: io::Error) -> DriverError {
    error!("读取输入流失败，放弃上传 {}: {}", key, err);
    DriverError::StreamIo(err)
}

/// 把非预期的响应转换为传输错误，附带 OSS 返回的错误信息
async fn failure(op: &str, key: &str, resp: OssResponse) -> DriverError {
    let status = resp.status;
    let detail = match resp.bytes().await {
        Ok(body) => OssErrorBody::describe(&body),
        Err(e) => e.to_string(),
    };
    DriverError::Transport(format!("{} {} 失败: {} {}", op, key, status, detail))
}

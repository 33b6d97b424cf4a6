//! OSS 驱动配置

use crate::error::{OssError, Result};
use crate::path::normalize_root;
use std::fmt;
use std::time::Duration;

/// 默认 OSS 端点
pub const DEFAULT_OSS_HOST: &str = "oss.aliyuncs.com";
/// 占位用的 AccessKey ID，不可用于生产
pub const DEFAULT_OSS_ACCESSID: &str = "<your access id>";
/// 占位用的 AccessKey Secret，不可用于生产
pub const DEFAULT_OSS_ACCESSKEY: &str = "<your access secret>";
/// 占位用的 bucket 名称
pub const DEFAULT_OSS_BUCKET: &str = "<your oss bucket>";
/// 默认请求超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// 默认分片大小 2MB
pub const DEFAULT_BUFFER_SIZE: usize = 2 * 1024 * 1024;
/// OSS 要求除最后一片外每片不小于 100KB
pub const MIN_PART_SIZE: usize = 100 * 1024;

/// OSS 驱动配置
///
/// 构造完成后不再修改，由 [`crate::OssStorage`] 持有。
#[derive(Clone)]
pub struct OssConfig {
    host: String,
    access_id: String,
    access_secret: String,
    bucket: String,
    root_path: String,
    buffer_size: usize,
    timeout: Duration,
}

impl OssConfig {
    pub fn new(
        host: impl Into<String>,
        access_id: impl Into<String>,
        access_secret: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            access_id: access_id.into(),
            access_secret: access_secret.into(),
            bucket: bucket.into(),
            root_path: String::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// 设置根路径，开头和结尾的 `/` 会被去掉
    pub fn with_root_path(mut self, root_path: &str) -> Self {
        self.root_path = normalize_root(root_path);
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn access_id(&self) -> &str {
        &self.access_id
    }

    pub fn access_secret(&self) -> &str {
        &self.access_secret
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 是否仍在使用占位凭证
    pub fn uses_placeholder_credentials(&self) -> bool {
        self.access_id == DEFAULT_OSS_ACCESSID
            || self.access_secret == DEFAULT_OSS_ACCESSKEY
            || self.bucket == DEFAULT_OSS_BUCKET
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(OssError::Config("host 不能为空".to_string()));
        }
        if self.bucket.trim().is_empty() {
            return Err(OssError::Config("bucket 不能为空".to_string()));
        }
        if self.buffer_size < MIN_PART_SIZE {
            return Err(OssError::Config(format!(
                "buffer_size {} 小于 OSS 最小分片大小 {}",
                self.buffer_size, MIN_PART_SIZE
            )));
        }
        Ok(())
    }
}

impl Default for OssConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_OSS_HOST,
            DEFAULT_OSS_ACCESSID,
            DEFAULT_OSS_ACCESSKEY,
            DEFAULT_OSS_BUCKET,
        )
    }
}

impl fmt::Debug for OssConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OssConfig")
            .field("host", &self.host)
            .field("access_id", &self.access_id)
            .field("access_secret", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("root_path", &self.root_path)
            .field("buffer_size", &self.buffer_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

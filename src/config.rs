use crate::error::{AppError, Result};
use registry_storage_oss::OssConfig;
use registry_storage_oss::config::{
    DEFAULT_BUFFER_SIZE, DEFAULT_OSS_ACCESSID, DEFAULT_OSS_ACCESSKEY, DEFAULT_OSS_BUCKET,
    DEFAULT_OSS_HOST, DEFAULT_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub oss: OssSection,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// OSS 连接配置
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OssSection {
    /// OSS 端点，可带 `http://` 或 `https://` 前缀
    pub host: String,
    pub access_id: String,
    pub access_secret: String,
    pub bucket: String,
    /// 仓库数据在 bucket 中的根路径
    pub root_path: String,
    /// 流式读写的分片大小（字节）
    pub buffer_size: usize,
    /// 请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for OssSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_OSS_HOST.to_string(),
            access_id: DEFAULT_OSS_ACCESSID.to_string(),
            access_secret: DEFAULT_OSS_ACCESSKEY.to_string(),
            bucket: DEFAULT_OSS_BUCKET.to_string(),
            root_path: "/registry".to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for OssSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OssSection")
            .field("host", &self.host)
            .field("access_id", &self.access_id)
            .field("access_secret", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("root_path", &self.root_path)
            .field("buffer_size", &self.buffer_size)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// 内容缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 是否启用缓存
    pub enable: bool,
    /// 缓存总容量（字节）
    pub max_capacity_bytes: u64,
    /// 单个条目的大小上限（字节），超过的内容不进缓存
    pub max_entry_bytes: u64,
    /// 缓存过期时间（秒）
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enable: false,
            max_capacity_bytes: 64 * 1024 * 1024, // 64MB
            max_entry_bytes: 1024 * 1024,         // 1MB
            ttl_secs: 3600,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// 日志级别或 EnvFilter 指令，例如 `info`、`registry_storage_oss=debug`
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("无法读取配置文件: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("配置文件解析失败: {}", e)))?;
        Ok(config)
    }

    pub fn load() -> Self {
        let mut config = Self::from_file("config.toml").unwrap_or_default();
        config.apply_env_overrides();
        config
    }

    /// 应用环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// 按给定的查找函数覆盖配置，无法解析的值会被忽略
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("OSS_HOST") {
            self.oss.host = host;
        }
        if let Some(access_id) = lookup("OSS_ACCESSID") {
            self.oss.access_id = access_id;
        }
        if let Some(access_secret) = lookup("OSS_ACCESSKEY") {
            self.oss.access_secret = access_secret;
        }
        if let Some(bucket) = lookup("OSS_BUCKET") {
            self.oss.bucket = bucket;
        }
        if let Some(root_path) = lookup("STORAGE_PATH") {
            self.oss.root_path = root_path;
        }
        if let Some(v) = lookup("OSS_BUFFER_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.oss.buffer_size = n;
        }
        if let Some(v) = lookup("OSS_TIMEOUT")
            && let Ok(n) = v.parse::<u64>()
        {
            self.oss.timeout_secs = n;
        }

        if let Some(enable) = lookup("CACHE_ENABLE") {
            self.cache.enable = enable.to_lowercase() == "true" || enable == "1";
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.log.level = level;
        }
    }

    /// 转换为 OSS 驱动配置
    pub fn to_oss_config(&self) -> OssConfig {
        OssConfig::new(
            self.oss.host.clone(),
            self.oss.access_id.clone(),
            self.oss.access_secret.clone(),
            self.oss.bucket.clone(),
        )
        .with_root_path(&self.oss.root_path)
        .with_buffer_size(self.oss.buffer_size)
        .with_timeout(Duration::from_secs(self.oss.timeout_secs))
    }
}

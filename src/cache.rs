//! 缓存模块
//!
//! 在任意存储驱动外面包一层 LRU 内容缓存：
//! `get_content` 读穿透，`put_content` 写穿透，`remove` 与 `stream_write` 负责失效。
//!
//! 每次写操作都会推进写纪元；读穿透只在未命中到回填之间纪元未变时才回填，
//! 避免并发写入或删除之后缓存旧内容。

use crate::config::CacheConfig;
use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use registry_driver_core::{
    ByteRange, ByteStream, ContentReader, KeyStream, Result, StorageDriver,
};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{trace, warn};

/// 带内容缓存的存储驱动
pub struct CachedDriver<D> {
    inner: D,
    cache: Cache<String, Bytes>,
    max_entry_bytes: u64,
    /// 写纪元，缓存的修改都在持锁时进行
    epoch: Mutex<u64>,
}

impl<D: StorageDriver> CachedDriver<D> {
    /// 创建缓存驱动
    /// - max_capacity_bytes: 缓存总容量（按内容大小计权）
    /// - max_entry_bytes: 单条内容上限
    /// - ttl_secs: 缓存过期时间（秒）
    pub fn new(inner: D, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity_bytes)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .weigher(|_key: &String, value: &Bytes| -> u32 {
                value.len().min(u32::MAX as usize) as u32
            })
            .support_invalidation_closures()
            .build();

        Self {
            inner,
            cache,
            max_entry_bytes: config.max_entry_bytes,
            epoch: Mutex::new(0),
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// 当前缓存中的条目（key 为完整对象键）
    pub async fn cached(&self, path: &str) -> Option<Bytes> {
        self.cache.get(&self.inner.full_path(path)).await
    }

    async fn current_epoch(&self) -> u64 {
        *self.epoch.lock().await
    }

    /// 缓存内容（如果大小允许），调用方需持有纪元锁
    async fn store(&self, key: String, content: &Bytes) {
        if content.len() as u64 <= self.max_entry_bytes {
            self.cache.insert(key, content.clone()).await;
        } else {
            self.cache.invalidate(&key).await;
        }
    }

    /// 失效 key 本身以及 `key/` 下的所有条目
    async fn invalidate_tree(&self, key: String) {
        self.cache.invalidate(&key).await;
        let prefix = format!("{}/", key);
        if let Err(e) = self
            .cache
            .invalidate_entries_if(move |k, _| k.starts_with(&prefix))
        {
            warn!("缓存前缀失效失败: {}: {}", key, e);
        }
    }
}

#[async_trait]
impl<D: StorageDriver> StorageDriver for CachedDriver<D> {
    fn supports_bytes_range(&self) -> bool {
        self.inner.supports_bytes_range()
    }

    fn full_path(&self, path: &str) -> String {
        self.inner.full_path(path)
    }

    async fn get_content(&self, path: &str) -> Result<Bytes> {
        let key = self.inner.full_path(path);
        if let Some(content) = self.cache.get(&key).await {
            trace!("缓存命中: {}", key);
            return Ok(content);
        }
        let start = self.current_epoch().await;
        let content = self.inner.get_content(path).await?;

        let epoch = self.epoch.lock().await;
        if *epoch == start {
            self.store(key, &content).await;
        } else {
            trace!("读取期间发生写入，跳过缓存: {}", key);
        }
        drop(epoch);
        Ok(content)
    }

    async fn put_content(&self, path: &str, content: Bytes) -> Result<String> {
        let key = self.inner.full_path(path);
        let start = self.current_epoch().await;
        let result = self.inner.put_content(path, content.clone()).await;

        let mut epoch = self.epoch.lock().await;
        let raced = *epoch != start;
        *epoch += 1;
        // 与其他写入交错时无法确定远端最终内容
        if result.is_ok() && !raced {
            self.store(key, &content).await;
        } else {
            self.cache.invalidate(&key).await;
        }
        drop(epoch);
        result
    }

    async fn stream_write(&self, path: &str, reader: ContentReader) -> Result<()> {
        let result = self.inner.stream_write(path, reader).await;

        let mut epoch = self.epoch.lock().await;
        *epoch += 1;
        self.cache.invalidate(&self.inner.full_path(path)).await;
        drop(epoch);
        result
    }

    async fn stream_read(&self, path: &str, range: Option<ByteRange>) -> Result<ByteStream> {
        self.inner.stream_read(path, range).await
    }

    async fn list_directory(&self, path: Option<&str>) -> Result<KeyStream> {
        self.inner.list_directory(path).await
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        self.inner.exists(path).await
    }

    async fn remove(&self, path: &str) -> Result<()> {
        // 失败时远端可能已删除一部分，同样需要失效
        let result = self.inner.remove(path).await;

        let mut epoch = self.epoch.lock().await;
        *epoch += 1;
        self.invalidate_tree(self.inner.full_path(path)).await;
        drop(epoch);
        result
    }

    async fn get_size(&self, path: &str) -> Result<u64> {
        self.inner.get_size(path).await
    }
}

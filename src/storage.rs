//! 存储驱动构建

use crate::cache::CachedDriver;
use crate::config::Config;
use crate::error::Result;
use registry_driver_core::StorageDriver;
use registry_storage_oss::OssStorage;
use std::sync::Arc;
use tracing::info;

/// 按配置构建存储驱动，启用缓存时在外层包一层 [`CachedDriver`]
pub fn build_driver(config: &Config) -> Result<Arc<dyn StorageDriver>> {
    let storage = OssStorage::new(config.to_oss_config())?;
    if config.cache.enable {
        info!(
            "内容缓存已启用: capacity={} 字节, ttl={} 秒",
            config.cache.max_capacity_bytes, config.cache.ttl_secs
        );
        Ok(Arc::new(CachedDriver::new(storage, &config.cache)))
    } else {
        Ok(Arc::new(storage))
    }
}

// registry-alioss 库接口
// 配置加载、日志初始化、内容缓存与驱动构建

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod storage;

// Re-export driver contract and OSS backend
pub use registry_driver_core as driver;
pub use registry_storage_oss as oss;

pub use cache::CachedDriver;
pub use config::{CacheConfig, Config, LogConfig, OssSection};
pub use error::{AppError, Result};
pub use logging::init_logging;
pub use registry_driver_core::{ByteRange, DriverError, StorageDriver};
pub use storage::build_driver;

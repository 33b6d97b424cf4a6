use registry_driver_core::DriverError;
use registry_storage_oss::OssError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("存储驱动错误: {0}")]
    Driver(#[from] DriverError),

    #[error("OSS 错误: {0}")]
    Oss(#[from] OssError),

    #[error("日志初始化失败: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

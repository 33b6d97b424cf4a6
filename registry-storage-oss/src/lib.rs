//! 阿里云 OSS 存储驱动
//!
//! 把仓库存储契约 [`StorageDriver`](registry_driver_core::StorageDriver)
//! 翻译为 OSS REST 调用：对象读写、HEAD、列举、删除，以及
//! 初始化、上传分片、完成三步走的分片上传。

pub mod client;
pub mod config;
mod error;
pub mod headers;
pub mod models;
pub mod path;
pub mod sign;
mod storage;
pub mod transport;

pub use config::OssConfig;
pub use error::{OssError, Result};
pub use storage::OssStorage;
pub use transport::{HttpTransport, Method, OssRequest, OssResponse, StatusCode, Transport};

//! 镜像仓库存储驱动的核心契约
//!
//! 本 crate 定义宿主仓库与各存储后端之间共享的接口，包括：
//! - 存储驱动 trait（八个基本操作）
//! - 驱动错误类型
//! - 字节范围与流类型

mod error;
mod range;
mod storage;

pub use error::{DriverError, Result};
pub use range::ByteRange;
pub use storage::*;

//! 存储驱动 trait 定义
//!
//! 提供统一的存储接口，宿主仓库通过该接口读写 blob 与 manifest

use crate::{ByteRange, DriverError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use tokio::io::AsyncRead;

/// 惰性字节块序列，有限且不可重放
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// 惰性对象键序列，有限且不可重放
pub type KeyStream = BoxStream<'static, Result<String>>;

/// 流式写入的输入源
pub type ContentReader = Box<dyn AsyncRead + Unpin + Send>;

/// 存储驱动 trait
///
/// 定义了仓库存储的基本操作接口，所有存储后端都应该实现此 trait。
/// 实现必须可以在多个并发调用者之间共享。
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// 是否支持按字节范围读取
    fn supports_bytes_range(&self) -> bool {
        false
    }

    /// 获取对象的完整键（基于相对路径）
    ///
    /// 对已解析过的键再次调用必须返回原值。
    fn full_path(&self, path: &str) -> String;

    /// 读取完整内容
    async fn get_content(&self, path: &str) -> Result<Bytes>;

    /// 写入完整内容
    ///
    /// # 返回
    /// 返回调用者传入的原始路径
    async fn put_content(&self, path: &str, content: Bytes) -> Result<String>;

    /// 从输入流写入，长度未知
    async fn stream_write(&self, path: &str, reader: ContentReader) -> Result<()>;

    /// 流式读取
    ///
    /// # 参数
    /// * `path` - 相对路径
    /// * `range` - 可选的字节范围，仅在 `supports_bytes_range` 为 true 时生效
    async fn stream_read(&self, path: &str, range: Option<ByteRange>) -> Result<ByteStream>;

    /// 列出前缀下的所有对象键
    ///
    /// # 参数
    /// * `path` - 相对路径，`None` 表示根目录
    async fn list_directory(&self, path: Option<&str>) -> Result<KeyStream>;

    /// 检查对象是否存在
    ///
    /// 以 `get_size` 是否成功来判定，不提供任何原子性保证。
    async fn exists(&self, path: &str) -> Result<bool> {
        match self.get_size(path).await {
            Ok(_) => Ok(true),
            Err(DriverError::NotFound(_)) => Ok(false),
            // 元数据查询本身成功了，只是缺少长度
            Err(DriverError::MissingMetadata(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// 递归删除路径及其下所有对象
    async fn remove(&self, path: &str) -> Result<()>;

    /// 获取对象大小（字节）
    async fn get_size(&self, path: &str) -> Result<u64>;
}

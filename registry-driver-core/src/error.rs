use thiserror::Error;

/// 存储驱动错误类型
///
/// 每个调用点显式决定返回 `NotFound` 还是 `Transport`，宿主据此区分
/// "对象不存在" 与 "远端调用失败"。
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("文件未找到: {0}")]
    NotFound(String),

    #[error("传输错误: {0}")]
    Transport(String),

    #[error("输入流读取失败: {0}")]
    StreamIo(std::io::Error),

    #[error("元数据缺失: {0}")]
    MissingMetadata(String),

    #[error("无效的路径: {0}")]
    InvalidPath(String),
}

impl DriverError {
    /// 是否为 "未找到" 错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound(_))
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, DriverError>;

use registry_driver_core::DriverError;
use thiserror::Error;

/// OSS 客户端错误类型
#[derive(Error, Debug)]
pub enum OssError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("响应体读取失败: {0}")]
    Body(#[from] std::io::Error),

    #[error("XML 错误: {0}")]
    Xml(String),
}

/// 客户端层面的失败一律视为传输错误，是否降级为 NotFound 由调用点决定
impl From<OssError> for DriverError {
    fn from(err: OssError) -> Self {
        DriverError::Transport(err.to_string())
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, OssError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = OssError::Config("bucket 不能为空".to_string());
        assert_eq!(err.to_string(), "配置错误: bucket 不能为空");
    }

    #[test]
    fn test_into_driver_error() {
        let err: DriverError = OssError::Xml("unexpected eof".to_string()).into();
        assert!(matches!(err, DriverError::Transport(ref msg) if msg.contains("unexpected eof")));
    }
}

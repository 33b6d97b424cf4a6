//! 日志初始化

use crate::config::LogConfig;
use crate::error::{AppError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// 初始化全局日志
///
/// `RUST_LOG` 优先于配置中的级别；已经存在全局 subscriber 时直接返回。
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.level)?,
    };

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .is_err()
    {
        tracing::debug!("全局日志已初始化，跳过");
    }
    Ok(())
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).map_err(|e| AppError::Logging(format!("{}: {}", level, e)))
}

//! 响应头解析

use std::collections::HashMap;

/// 大小写不敏感的响应头表
///
/// 由远端返回的原始 (name, value) 列表构建，键统一转成小写。
#[derive(Debug, Clone, Default)]
pub struct ResponseHeaders {
    map: HashMap<String, String>,
}

impl ResponseHeaders {
    pub fn from_raw(raw: &[(String, String)]) -> Self {
        let map = raw
            .iter()
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.clone()))
            .collect();
        Self { map }
    }

    /// 按名称查找，忽略大小写和首尾空白
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map
            .get(&name.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    /// 解析 Content-Length，缺失或无法解析时返回 None
    pub fn content_length(&self) -> Option<u64> {
        self.get("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn etag(&self) -> Option<&str> {
        self.get("etag")
    }
}

use std::fmt;

/// 读取的字节范围（闭区间）
///
/// `end` 为 `None` 表示一直读到对象末尾。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// 从 `start` 读到末尾
    pub fn from_offset(start: u64) -> Self {
        Self { start, end: None }
    }

    /// 范围内的字节数，开放区间返回 `None`
    pub fn size(&self) -> Option<u64> {
        self.end
            .map(|end| end.saturating_sub(self.start).saturating_add(1))
    }
}

/// 按 HTTP `Range` 头的格式输出，例如 `bytes=0-99`
impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "bytes={}-{}", self.start, end),
            None => write!(f, "bytes={}-", self.start),
        }
    }
}

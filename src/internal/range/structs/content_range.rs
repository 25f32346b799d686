use std::fmt;

use super::range::Range;

/// 带总长度的区间描述，形如 `low-high/size`；未知部分以 `*` 表示。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentRange {
    pub span: Option<Range>,
    pub size: Option<i64>,
}

impl ContentRange {
    pub fn new(span: Range, size: Option<i64>) -> Self {
        Self {
            span: Some(span),
            size,
        }
    }

    /// 区间反向，或终点超过已知总长度时无效。
    pub fn is_valid(&self) -> bool {
        match (self.span, self.size) {
            (Some(span), _) if span.low > span.high => false,
            (Some(span), Some(size)) => size >= span.high,
            _ => true,
        }
    }

    /// 区间部分，未知时为 `*`。
    pub fn range_part(&self) -> String {
        match self.span {
            Some(span) => span.to_string(),
            None => "*".to_string(),
        }
    }
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size {
            Some(size) => write!(f, "{}/{}", self.range_part(), size),
            None => write!(f, "{}/*", self.range_part()),
        }
    }
}

use std::fmt;

use crate::internal::errors::{AssemblyError, AssemblyResultOf};

/// 闭区间 `[low, high]`，单位为字节偏移。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub low: i64,
    pub high: i64,
}

impl Range {
    /// 创建区间；`low > high` 时返回 `InvalidRange`。
    pub fn new(low: i64, high: i64) -> AssemblyResultOf<Self> {
        if low > high {
            return Err(AssemblyError::InvalidRange { low, high });
        }
        Ok(Self { low, high })
    }

    /// 从 `offset` 起长 `len` 字节的块所覆盖的区间。
    ///
    /// 偏移为负、长度为零或终点超出 `i64` 时返回 `InvalidRange`。
    pub fn of_chunk(offset: i64, len: usize) -> AssemblyResultOf<Self> {
        let len = i64::try_from(len).unwrap_or(i64::MAX);
        let high = len.checked_sub(1).and_then(|n| offset.checked_add(n));
        match high {
            Some(high) if offset >= 0 && len > 0 => Ok(Self { low: offset, high }),
            _ => Err(AssemblyError::InvalidRange {
                low: offset,
                high: offset.saturating_add(len.saturating_sub(1)),
            }),
        }
    }

    /// 区间覆盖的字节数。
    pub fn len(&self) -> u64 {
        (self.high - self.low) as u64 + 1
    }

    pub fn contains(&self, offset: i64) -> bool {
        self.low <= offset && offset <= self.high
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

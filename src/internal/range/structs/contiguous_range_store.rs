//! 单段区间集合：调用方保证按顺序、连续地完成写入时使用，比通用集合更轻量。

use crate::internal::errors::{AssemblyError, AssemblyResultOf};
use crate::internal::range::structs::range::Range;
use crate::internal::range::traits::range_store::RangeStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContiguousRangeStore {
    span: Option<Range>,
}

impl ContiguousRangeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RangeStore for ContiguousRangeStore {
    /// 新区间必须与当前区间相交或相邻，否则返回 `IllegalRange`。
    fn add(&mut self, low: i64, high: i64) -> AssemblyResultOf<()> {
        let incoming = Range::new(low, high)?;
        let merged = match self.span {
            None => incoming,
            Some(current) => {
                let touches = incoming.low <= current.high.saturating_add(1)
                    && incoming.high >= current.low.saturating_sub(1);
                if !touches {
                    return Err(AssemblyError::IllegalRange { low, high });
                }
                Range {
                    low: current.low.min(incoming.low),
                    high: current.high.max(incoming.high),
                }
            }
        };
        self.span = Some(merged);
        Ok(())
    }

    fn sub(&mut self, _low: i64, _high: i64) -> AssemblyResultOf<()> {
        Err(AssemblyError::NotImplemented("单段区间集合不支持 sub"))
    }

    fn ranges(&self) -> Box<dyn Iterator<Item = Range> + '_> {
        Box::new(self.span.into_iter())
    }

    fn clear(&mut self) {
        self.span = None;
    }

    fn span(&self) -> Option<Range> {
        self.span
    }

    fn size(&self) -> usize {
        usize::from(self.span.is_some())
    }
}

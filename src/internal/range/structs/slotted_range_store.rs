//! 通用区间集合：以起点为键的 `BTreeMap`，键严格递增，区间两两既不相交也不相邻。

use std::collections::BTreeMap;
use std::fmt;

use crate::internal::errors::{AssemblyError, AssemblyResultOf};
use crate::internal::range::structs::range::Range;
use crate::internal::range::traits::range_store::RangeStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlottedRangeStore {
    slots: BTreeMap<i64, i64>,
}

impl SlottedRangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 起点 `<= key` 的最后一个区间。
    fn floor_entry(&self, key: i64) -> Option<(i64, i64)> {
        self.slots.range(..=key).next_back().map(|(k, v)| (*k, *v))
    }

    /// 起点 `< key` 的最后一个区间。
    fn lower_entry(&self, key: i64) -> Option<(i64, i64)> {
        self.slots.range(..key).next_back().map(|(k, v)| (*k, *v))
    }

    /// 删除起点落在 `[low, high]` 内的所有区间。
    fn clear_starts_within(&mut self, low: i64, high: i64) {
        let covered: Vec<i64> = self.slots.range(low..=high).map(|(k, _)| *k).collect();
        for key in covered {
            self.slots.remove(&key);
        }
    }
}

impl RangeStore for SlottedRangeStore {
    fn add(&mut self, low: i64, high: i64) -> AssemblyResultOf<()> {
        if low > high {
            return Err(AssemblyError::InvalidRange { low, high });
        }

        let mut low_to_add = low;
        let mut high_to_add = high;

        if let Some((key, value)) = self.floor_entry(low) {
            if value >= low.saturating_sub(1) {
                low_to_add = key;
                if value >= high_to_add {
                    high_to_add = value;
                }
            }
        }

        if let Some((_, value)) = self.floor_entry(high.saturating_add(1)) {
            if value >= high_to_add {
                high_to_add = value;
            }
        }

        self.clear_starts_within(low_to_add, high_to_add);
        self.slots.insert(low_to_add, high_to_add);
        Ok(())
    }

    fn sub(&mut self, low: i64, high: i64) -> AssemblyResultOf<()> {
        if low > high {
            return Err(AssemblyError::InvalidRange { low, high });
        }

        // 起点在 low 之前且跨过 low 的区间：截断尾部，超出 high 的部分重新加回
        if let Some((key, value)) = self.lower_entry(low) {
            if value >= low {
                self.slots.insert(key, low - 1);
                if value > high {
                    self.add(high + 1, value)?;
                }
            }
        }

        // 起点在 [low, high] 内但终点超出 high 的区间：只保留 high 之后的部分
        if let Some((key, value)) = self.floor_entry(high) {
            if value > high {
                self.slots.remove(&key);
                self.add(high + 1, value)?;
            }
        }

        self.clear_starts_within(low, high);
        Ok(())
    }

    fn ranges(&self) -> Box<dyn Iterator<Item = Range> + '_> {
        Box::new(
            self.slots
                .iter()
                .map(|(low, high)| Range { low: *low, high: *high }),
        )
    }

    fn clear(&mut self) {
        self.slots.clear();
    }

    fn span(&self) -> Option<Range> {
        let (low, _) = self.slots.first_key_value()?;
        let (_, high) = self.slots.last_key_value()?;
        Some(Range {
            low: *low,
            high: *high,
        })
    }

    fn size(&self) -> usize {
        self.slots.len()
    }
}

impl fmt::Display for SlottedRangeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.get_ranges())
    }
}

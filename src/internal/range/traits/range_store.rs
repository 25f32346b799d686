//! 区间集合 trait 及其独立序列化格式。
//!
//! 序列化格式（大端）：8 字节长度（条目数 × 16），随后为按起点升序的 `(low, high)` 对。

use std::io::{Read, Write};

use crate::internal::errors::{AssemblyError, AssemblyResultOf};
use crate::internal::range::structs::range::Range;
use crate::internal::utils::read_full;

/// 单个 `(low, high)` 条目的字节数。
pub const RANGE_ENTRY_SIZE: usize = 16;

/// 有序、互不相交且互不相邻的区间集合。
pub trait RangeStore: Send + Sync {
    /// 并入 `[low, high]`，与相交或相邻的区间合并。
    fn add(&mut self, low: i64, high: i64) -> AssemblyResultOf<()>;

    /// 从集合中去掉 `[low, high]`，必要时拆分已有区间。
    fn sub(&mut self, low: i64, high: i64) -> AssemblyResultOf<()>;

    /// 按起点升序遍历所有区间；每次调用都返回新的迭代器。
    fn ranges(&self) -> Box<dyn Iterator<Item = Range> + '_>;

    /// 清空集合。
    fn clear(&mut self);

    /// 首个区间的起点到最后一个区间的终点；空集合返回 `None`。
    fn span(&self) -> Option<Range>;

    /// 互不相交的区间个数。
    fn size(&self) -> usize;

    /// `"low-high"` 以逗号连接，空集合为空字符串。
    fn get_ranges(&self) -> String {
        self.ranges()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// 将当前集合写入 `writer`，返回条目部分的字节数。
    fn store(&self, writer: &mut dyn Write) -> AssemblyResultOf<u64> {
        let entries: Vec<Range> = self.ranges().collect();
        let range_len = (entries.len() * RANGE_ENTRY_SIZE) as u64;

        let mut buf = Vec::with_capacity(8 + entries.len() * RANGE_ENTRY_SIZE);
        buf.extend_from_slice(&range_len.to_be_bytes());
        for r in &entries {
            buf.extend_from_slice(&encode_range(r.low, r.high));
        }
        writer.write_all(&buf)?;
        Ok(range_len)
    }

    /// 从 `reader` 读取并并入集合。
    ///
    /// 读到的数据不完整时集合被清空并返回错误，不会留下部分结果。
    fn load(&mut self, reader: &mut dyn Read) -> AssemblyResultOf<()> {
        let entries = match read_entries(reader) {
            Ok(Some(entries)) => entries,
            Ok(None) => return Ok(()),
            Err(e) => {
                self.clear();
                return Err(e);
            }
        };

        for (low, high) in entries {
            if let Err(e) = self.add(low, high) {
                self.clear();
                return Err(e);
            }
        }
        Ok(())
    }
}

/// 编码单个条目。
pub fn encode_range(low: i64, high: i64) -> [u8; RANGE_ENTRY_SIZE] {
    let mut buf = [0u8; RANGE_ENTRY_SIZE];
    buf[0..8].copy_from_slice(&low.to_be_bytes());
    buf[8..16].copy_from_slice(&high.to_be_bytes());
    buf
}

/// 解码单个条目。
pub fn decode_range(buf: &[u8; RANGE_ENTRY_SIZE]) -> (i64, i64) {
    let mut low = [0u8; 8];
    let mut high = [0u8; 8];
    low.copy_from_slice(&buf[0..8]);
    high.copy_from_slice(&buf[8..16]);
    (i64::from_be_bytes(low), i64::from_be_bytes(high))
}

/// 读取长度前缀及全部条目；没有任何数据时返回 `Ok(None)`。
fn read_entries(reader: &mut dyn Read) -> AssemblyResultOf<Option<Vec<(i64, i64)>>> {
    let mut len_buf = [0u8; 8];
    let got = read_full(reader, &mut len_buf)?;
    if got == 0 {
        return Ok(None);
    }
    if got < len_buf.len() {
        return Err(AssemblyError::ChannelUnderflow {
            expected: len_buf.len() as u64,
            actual: got as u64,
        });
    }

    let range_len = u64::from_be_bytes(len_buf);
    if range_len % RANGE_ENTRY_SIZE as u64 != 0 {
        return Err(AssemblyError::ChannelUnderflow {
            expected: range_len.next_multiple_of(RANGE_ENTRY_SIZE as u64),
            actual: range_len,
        });
    }

    let count = range_len / RANGE_ENTRY_SIZE as u64;
    let mut entries = Vec::new();
    let mut entry = [0u8; RANGE_ENTRY_SIZE];
    for read_count in 0..count {
        let got = read_full(reader, &mut entry)?;
        if got < RANGE_ENTRY_SIZE {
            return Err(AssemblyError::ChannelUnderflow {
                expected: range_len,
                actual: read_count * RANGE_ENTRY_SIZE as u64 + got as u64,
            });
        }
        entries.push(decode_range(&entry));
    }
    Ok(Some(entries))
}

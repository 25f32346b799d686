//! 组装日志头：固定长度的二进制记录（大端）。
//!
//! | 偏移 | 长度 | 字段 |
//! |---|---|---|
//! | 0  | 3  | 签名 `FAL` |
//! | 3  | 8  | span.low |
//! | 11 | 8  | span.high |
//! | 19 | 4  | 标签长度（≤ 16） |
//! | 23 | 16 | 标签字节，超出长度部分补零 |

use std::fmt;
use std::io::{Read, Write};

use crate::internal::errors::{AssemblyError, AssemblyResultOf};
use crate::internal::range::structs::range::Range;
use crate::internal::utils::read_full;

/// 日志文件签名（ASCII "FAL"）。
pub const LOG_MAGIC: [u8; 3] = [0x46, 0x41, 0x4C];

/// 标签槽位的字节数上限。
pub const MAX_TAG_SIZE: usize = 16;

/// 日志头总长度：签名 + 区间 (8 + 8) + 标签槽 (4 + 16)。
pub const HEADER_SIZE: usize = LOG_MAGIC.len() + 16 + (4 + MAX_TAG_SIZE);

const SPAN_OFFSET: usize = LOG_MAGIC.len();
const TAG_LEN_OFFSET: usize = SPAN_OFFSET + 16;
const TAG_OFFSET: usize = TAG_LEN_OFFSET + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyLogHeader {
    low: i64,
    high: i64,
    tag_len: u32,
    tag_slot: [u8; MAX_TAG_SIZE],
}

impl Default for AssemblyLogHeader {
    fn default() -> Self {
        Self {
            low: 0,
            high: 0,
            tag_len: 0,
            tag_slot: [0u8; MAX_TAG_SIZE],
        }
    }
}

impl AssemblyLogHeader {
    pub fn new(low: i64, high: i64, tag: &[u8]) -> AssemblyResultOf<Self> {
        let mut header = Self::default();
        header.init(low, high, tag)?;
        Ok(header)
    }

    /// 设置区间与标签；校验失败时保持原值不变。
    pub fn init(&mut self, low: i64, high: i64, tag: &[u8]) -> AssemblyResultOf<()> {
        if low > high {
            return Err(AssemblyError::InvalidRange { low, high });
        }
        if tag.len() > MAX_TAG_SIZE {
            return Err(AssemblyError::TagTooLarge {
                len: tag.len(),
                max: MAX_TAG_SIZE,
            });
        }

        let mut tag_slot = [0u8; MAX_TAG_SIZE];
        tag_slot[..tag.len()].copy_from_slice(tag);

        self.low = low;
        self.high = high;
        self.tag_len = tag.len() as u32;
        self.tag_slot = tag_slot;
        Ok(())
    }

    pub fn span(&self) -> Range {
        Range {
            low: self.low,
            high: self.high,
        }
    }

    /// 标签字节；长度前缀超过槽位时视为日志头损坏。
    pub fn tag(&self) -> AssemblyResultOf<&[u8]> {
        let len = self.tag_len as usize;
        if len > MAX_TAG_SIZE {
            return Err(AssemblyError::CorruptHeader(format!(
                "标签长度 {} 超过上限 {}",
                len, MAX_TAG_SIZE
            )));
        }
        Ok(&self.tag_slot[..len])
    }

    pub const fn size() -> usize {
        HEADER_SIZE
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[..SPAN_OFFSET].copy_from_slice(&LOG_MAGIC);
        buf[SPAN_OFFSET..SPAN_OFFSET + 8].copy_from_slice(&self.low.to_be_bytes());
        buf[SPAN_OFFSET + 8..TAG_LEN_OFFSET].copy_from_slice(&self.high.to_be_bytes());
        buf[TAG_LEN_OFFSET..TAG_OFFSET].copy_from_slice(&self.tag_len.to_be_bytes());
        buf[TAG_OFFSET..].copy_from_slice(&self.tag_slot);
        buf
    }

    /// 解析日志头。只校验长度与签名，标签长度留给 [`Self::tag`] 校验。
    pub fn decode(buf: &[u8]) -> AssemblyResultOf<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(AssemblyError::ChannelUnderflow {
                expected: HEADER_SIZE as u64,
                actual: buf.len() as u64,
            });
        }
        if buf[..SPAN_OFFSET] != LOG_MAGIC {
            return Err(AssemblyError::BadSignature);
        }

        let mut low = [0u8; 8];
        let mut high = [0u8; 8];
        let mut tag_len = [0u8; 4];
        let mut tag_slot = [0u8; MAX_TAG_SIZE];
        low.copy_from_slice(&buf[SPAN_OFFSET..SPAN_OFFSET + 8]);
        high.copy_from_slice(&buf[SPAN_OFFSET + 8..TAG_LEN_OFFSET]);
        tag_len.copy_from_slice(&buf[TAG_LEN_OFFSET..TAG_OFFSET]);
        tag_slot.copy_from_slice(&buf[TAG_OFFSET..HEADER_SIZE]);

        Ok(Self {
            low: i64::from_be_bytes(low),
            high: i64::from_be_bytes(high),
            tag_len: u32::from_be_bytes(tag_len),
            tag_slot,
        })
    }

    pub fn write(&self, writer: &mut dyn Write) -> AssemblyResultOf<()> {
        writer.write_all(&self.encode())?;
        Ok(())
    }

    pub fn read(reader: &mut dyn Read) -> AssemblyResultOf<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        let got = read_full(reader, &mut buf)?;
        Self::decode(&buf[..got])
    }
}

impl fmt::Display for AssemblyLogHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag() {
            Ok(tag) => write!(
                f,
                "AssemblyLogHeader[{}, tag={}]",
                self.span(),
                String::from_utf8_lossy(tag)
            ),
            Err(_) => write!(f, "AssemblyLogHeader[{}, tag=<corrupt>]", self.span()),
        }
    }
}

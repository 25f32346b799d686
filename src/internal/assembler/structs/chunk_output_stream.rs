//! 块输出流：逐字节缓冲到定长块，块满或 flush 时整块交给组装器写入。

use std::io;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};

use crate::internal::assembler::traits::buffer_source::BufferSource;
use crate::internal::assembler::traits::file_assembler::FileAssembler;
use crate::internal::errors::{AssemblyError, AssemblyResultOf};

/// 覆盖闭区间 `[start, end]` 的有界输出流，写满 `end - start + 1` 字节后再写返回 `Overflow`。
pub struct ChunkOutputStream<'a> {
    assembler: &'a dyn FileAssembler,
    buffer_source: Arc<dyn BufferSource>,
    block_size: usize,
    buf: Option<BytesMut>,
    /// 下一块写入的文件偏移
    cursor: i64,
    required: i64,
    accepted: i64,
}

impl<'a> ChunkOutputStream<'a> {
    pub fn new(
        assembler: &'a dyn FileAssembler,
        start: i64,
        end: i64,
        buffer_source: Arc<dyn BufferSource>,
        block_size: usize,
    ) -> AssemblyResultOf<Self> {
        if end < start {
            return Err(AssemblyError::InvalidRange {
                low: start,
                high: end,
            });
        }
        Ok(Self {
            assembler,
            buffer_source,
            block_size: block_size.max(1),
            buf: None,
            cursor: start,
            required: end - start + 1,
            accepted: 0,
        })
    }

    /// 还能接收的字节数。
    pub fn remaining(&self) -> i64 {
        self.required - self.accepted
    }

    /// 写入单个字节。
    pub fn put(&mut self, byte: u8) -> AssemblyResultOf<()> {
        self.put_slice(&[byte])
    }

    /// 写入整段字节；超出剩余容量时不写入任何字节并返回 `Overflow`。
    pub fn put_slice(&mut self, bytes: &[u8]) -> AssemblyResultOf<()> {
        if bytes.len() as i64 > self.remaining() {
            return Err(AssemblyError::Overflow {
                limit: self.required,
            });
        }
        let mut rest = bytes;
        while !rest.is_empty() {
            let block_size = self.block_size;
            let buf = self
                .buf
                .get_or_insert_with(|| self.buffer_source.acquire(block_size));
            let room = block_size - buf.len();
            let take = room.min(rest.len());
            buf.put_slice(&rest[..take]);
            rest = &rest[take..];
            self.accepted += take as i64;

            if buf.len() >= block_size {
                self.flush_block();
            }
        }
        Ok(())
    }

    /// 把已缓冲的字节作为一块交给组装器，并归还缓冲区。
    pub fn flush_block(&mut self) {
        if let Some(mut buf) = self.buf.take() {
            let chunk = buf.split().freeze();
            let size = chunk.len() as i64;
            if size > 0 {
                self.assembler.write(chunk, self.cursor);
                self.cursor += size;
            }
            self.buffer_source.release(buf);
        }
    }

    pub fn close(mut self) {
        self.flush_block();
    }
}

impl io::Write for ChunkOutputStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let fit = (self.remaining().max(0) as usize).min(buf.len());
        if fit == 0 {
            return Err(io::Error::other(AssemblyError::Overflow {
                limit: self.required,
            }));
        }
        self.put_slice(&buf[..fit]).map_err(io::Error::other)?;
        Ok(fit)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_block();
        Ok(())
    }
}

impl Drop for ChunkOutputStream<'_> {
    fn drop(&mut self) {
        self.flush_block();
    }
}

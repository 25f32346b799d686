//! 从数据源按块读取并提交写入。

use std::io::Read;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tracing::debug;

use crate::internal::errors::{AssemblyError, AssemblyResultOf};
use crate::internal::utils::read_full;

use super::TrackingFileAssembler;

fn span_len(start_pos: i64, end_pos: i64) -> AssemblyResultOf<i64> {
    if end_pos < start_pos {
        return Err(AssemblyError::InvalidRange {
            low: start_pos,
            high: end_pos,
        });
    }
    Ok(end_pos - start_pos + 1)
}

impl TrackingFileAssembler {
    /// 从 `reader` 读取最多 `[start_pos, end_pos]` 的字节，按 `buffer_size` 分块提交写入。
    ///
    /// 数据源提前结束时停止，返回实际提交的字节数。写入失败不会中断读取，
    /// 需通过 `result()` 查看。
    pub fn consume(
        &self,
        reader: &mut dyn Read,
        start_pos: i64,
        end_pos: i64,
    ) -> AssemblyResultOf<i64> {
        let assembler = self.assembler()?;
        let total = span_len(start_pos, end_pos)?;
        let block_size = self.config.buffer_size.max(1) as i64;

        let mut offset = start_pos;
        let mut remaining = total;
        while remaining > 0 {
            let to_read = remaining.min(block_size) as usize;
            let mut block = self.buffer_source.acquire(to_read);
            block.resize(to_read, 0);

            let got = match read_full(reader, &mut block) {
                Ok(got) => got,
                Err(e) => {
                    self.buffer_source.release(block);
                    return Err(e.into());
                }
            };
            if got > 0 {
                block.truncate(got);
                assembler.write(block.split().freeze(), offset);
                offset += got as i64;
                remaining -= got as i64;
            }
            self.buffer_source.release(block);

            if got < to_read {
                debug!(offset, remaining, "数据源提前结束");
                break;
            }
        }
        Ok(total - remaining)
    }

    /// 异步版本的 [`Self::consume`]：逐个取出字节流中的块并提交写入，超出区间的部分被截断。
    pub async fn consume_stream<S>(
        &self,
        mut stream: S,
        start_pos: i64,
        end_pos: i64,
    ) -> AssemblyResultOf<i64>
    where
        S: Stream<Item = std::io::Result<Bytes>> + Unpin,
    {
        let assembler = self.assembler()?;
        let total = span_len(start_pos, end_pos)?;

        let mut offset = start_pos;
        let mut remaining = total;
        while remaining > 0 {
            let Some(item) = stream.next().await else {
                debug!(offset, remaining, "字节流提前结束");
                break;
            };
            let mut chunk = item?;
            if chunk.len() as i64 > remaining {
                chunk.truncate(remaining as usize);
            }
            if chunk.is_empty() {
                continue;
            }
            let len = chunk.len() as i64;
            assembler.write(chunk, offset);
            offset += len;
            remaining -= len;
        }
        Ok(total - remaining)
    }
}

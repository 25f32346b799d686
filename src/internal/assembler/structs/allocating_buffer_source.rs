use bytes::BytesMut;

use crate::internal::assembler::traits::buffer_source::BufferSource;

/// 不做池化的缓冲区来源：每次借出都新分配，归还时直接丢弃。
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocatingBufferSource;

impl BufferSource for AllocatingBufferSource {
    fn acquire(&self, size: usize) -> BytesMut {
        BytesMut::with_capacity(size)
    }

    fn release(&self, _buf: BytesMut) {}
}

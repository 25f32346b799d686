use bytes::BytesMut;

/// 缓冲区来源：按大小借出可复用的缓冲区，用完归还。
///
/// 组装逻辑不依赖池化的正确性，每次都新分配的实现也是合法的。
pub trait BufferSource: Send + Sync {
    fn acquire(&self, size: usize) -> BytesMut;

    fn release(&self, buf: BytesMut);
}

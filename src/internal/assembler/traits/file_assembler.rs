//! 组装器 trait：把块写入部分文件，并在写入完成后记录到组装日志。
//!
//! 两种实现：
//! - [`SyncFileAssembler`](crate::assembler::SyncFileAssembler)：调用线程内完成写入与日志追加；
//! - [`AsyncFileAssembler`](crate::assembler::AsyncFileAssembler)：提交后立即返回，写入在 tokio 运行时中完成。

use bytes::Bytes;

use crate::internal::assembler::structs::assembly_result::AssemblyResult;
use crate::internal::errors::AssemblyResultOf;
use crate::internal::states::progress_state::{AssemblyProgress, ProgressWatcher};

pub trait FileAssembler: Send + Sync {
    /// 打开部分文件并初始化组装日志。
    fn init(&mut self) -> AssemblyResultOf<()>;

    /// 当前的组装结果快照；返回后清除记录的最近错误。
    fn result(&self) -> AssemblyResultOf<AssemblyResult>;

    /// 把 `chunk` 写到 `offset`。失败不会向调用方返回，只记录为最近错误，通过 [`Self::result`] 获取。
    fn write(&self, chunk: Bytes, offset: i64);

    /// 等待已提交的写入完成（异步实现）并落盘。
    fn flush(&self) -> AssemblyResultOf<()>;

    fn close(&self) -> AssemblyResultOf<()>;

    /// 进度快照。
    fn progress(&self) -> AssemblyProgress;

    /// 监听进度变化。
    fn watch_progress(&self) -> ProgressWatcher;
}

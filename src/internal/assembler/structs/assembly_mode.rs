/// 组装器的写入方式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssemblyMode {
    /// 调用线程内完成写入与日志追加
    #[default]
    Sync,
    /// 提交后立即返回，写入在 tokio 运行时中完成
    Async,
}

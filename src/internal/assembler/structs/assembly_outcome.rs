use std::path::PathBuf;

use crate::internal::range::structs::slotted_range_store::SlottedRangeStore;

/// [`TrackingFileAssembler::close`](super::tracking_file_assembler::TrackingFileAssembler::close) 的结果。
#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyOutcome {
    /// 已无缺失区间：日志已删除，部分文件已重命名为 `path`
    Finalized { path: PathBuf },
    /// 仍有缺失区间，或关闭了自动清理；部分文件与日志保留，供下次续传
    Pending { missing: SlottedRangeStore },
    /// 从未成功初始化，没有任何需要处理的文件
    Untouched,
}

impl AssemblyOutcome {
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized { .. })
    }
}

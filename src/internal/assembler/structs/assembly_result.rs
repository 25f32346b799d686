use crate::internal::errors::AssemblyError;
use crate::internal::range::structs::slotted_range_store::SlottedRangeStore;
use crate::internal::range::traits::range_store::RangeStore;

/// `result()` 返回的组装结果快照。
#[derive(Debug)]
pub struct AssemblyResult {
    /// 尚未写入的区间，来自组装日志的重放
    pub missing_ranges: SlottedRangeStore,
    /// 已提交的块数
    pub submitted: u64,
    /// 已完成并记录日志的块数（异步实现中也包含失败的块）
    pub completed: u64,
    /// 上次调用 `result()` 之后记录的最近一次错误；多次失败时只保留最后一次
    pub last_error: Option<AssemblyError>,
}

impl AssemblyResult {
    /// 没有缺失区间，整个文件已写完。
    pub fn is_complete(&self) -> bool {
        self.missing_ranges.size() == 0
    }

    /// 所有已提交的块都已完成。
    pub fn is_drained(&self) -> bool {
        self.completed >= self.submitted
    }
}

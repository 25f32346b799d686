//! 区间领域模块：闭区间值类型与区间集合的两种实现。
//!
//! 对外导出以 [`crate::range`] 为准，此处仅做模块划分。

pub mod structs;
pub mod traits;

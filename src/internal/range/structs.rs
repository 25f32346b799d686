pub mod content_range;
pub mod contiguous_range_store;
pub mod range;
pub mod slotted_range_store;

pub use content_range::ContentRange;
pub use contiguous_range_store::ContiguousRangeStore;
pub use range::Range;
pub use slotted_range_store::SlottedRangeStore;

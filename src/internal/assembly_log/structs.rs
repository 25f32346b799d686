pub mod assembly_log;
pub mod assembly_log_header;

pub use assembly_log::AssemblyLog;
pub use assembly_log_header::{AssemblyLogHeader, HEADER_SIZE, LOG_MAGIC, MAX_TAG_SIZE};

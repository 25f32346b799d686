pub mod allocating_buffer_source;
pub mod assembler_config;
pub mod assembly_mode;
pub mod assembly_outcome;
pub mod assembly_result;
pub mod async_file_assembler;
pub mod chunk_output_stream;
pub mod sync_file_assembler;
pub mod tracking_file_assembler;

pub use allocating_buffer_source::AllocatingBufferSource;
pub use assembler_config::{AssemblerConfig, DEFAULT_BUFFER_SIZE, LOG_EXT, PART_EXT};
pub use assembly_mode::AssemblyMode;
pub use assembly_outcome::AssemblyOutcome;
pub use assembly_result::AssemblyResult;
pub use async_file_assembler::AsyncFileAssembler;
pub use chunk_output_stream::ChunkOutputStream;
pub use sync_file_assembler::SyncFileAssembler;
pub use tracking_file_assembler::{to_log_file, to_part_file, TrackingFileAssembler};

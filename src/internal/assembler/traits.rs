pub mod buffer_source;
pub mod file_assembler;

pub use buffer_source::BufferSource;
pub use file_assembler::FileAssembler;

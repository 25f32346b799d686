pub mod assembler;
pub mod assembly_log;
pub mod errors;
pub mod range;
pub mod states;
pub(crate) mod utils;

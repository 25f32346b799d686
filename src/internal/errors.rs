pub mod assembly_error;

pub use assembly_error::{AssemblyError, AssemblyResultOf};

mod cortex_error;
mod storage_error;

pub use cortex_error::{CortexError, CortexResult};
pub use storage_error::StorageError;

pub mod config;
pub mod errors;
pub mod ids;
pub mod models;
pub mod tokens;
pub mod traits;

pub use errors::{CortexError, CortexResult, StorageError};

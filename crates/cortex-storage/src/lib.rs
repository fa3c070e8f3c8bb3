pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use cortex_core::CortexError;

/// Wraps a low-level storage failure into the core error taxonomy (§7).
pub fn to_storage_err(message: String) -> CortexError {
    CortexError::Storage(cortex_core::StorageError::SqliteError { message })
}

pub(crate) fn map_sqlite(err: rusqlite::Error) -> CortexError {
    to_storage_err(err.to_string())
}

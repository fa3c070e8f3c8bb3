use thiserror::Error;

/// Errors surfaced by the data store adapter, below the `CortexError` taxonomy.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {message}")]
    SqliteError { message: String },

    #[error("connection pool exhausted")]
    PoolExhausted,

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("transaction already closed")]
    TransactionClosed,
}

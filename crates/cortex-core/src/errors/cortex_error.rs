use thiserror::Error;

use super::storage_error::StorageError;

/// Error taxonomy (§7). Every public operation in the core returns this type.
#[derive(Debug, Error)]
pub enum CortexError {
    #[error("not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("store error: {0}")]
    StoreError(String),

    #[error("embed error: {0}")]
    EmbedError(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type CortexResult<T> = Result<T, CortexError>;

impl CortexError {
    /// HTTP status mapping from §7. No HTTP layer lives in this crate; the
    /// mapping itself is part of the contract and is exercised by tests.
    pub fn http_status(&self) -> u16 {
        match self {
            CortexError::NotFound { .. } => 404,
            CortexError::Conflict(_) => 409,
            CortexError::ValidationError(_) => 422,
            CortexError::StoreError(_) | CortexError::Storage(_) => 503,
            CortexError::EmbedError(_) => 502,
            CortexError::InvariantViolation(_) => 500,
            CortexError::ConfigError(_) => 500,
            CortexError::Serialization(_) => 422,
        }
    }
}

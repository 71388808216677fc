use thiserror::Error;

use super::StoreError;

/// Error type for link service operations
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The payload was missing or blank
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The requested custom code cannot be used
    #[error("Invalid code: {0}")]
    InvalidCode(String),

    /// No live entry exists for the code
    #[error("Not found: {0}")]
    NotFound(String),

    /// The generation loop ran out of attempts without finding a free code
    #[error("Storage exhausted: {0}")]
    StorageExhausted(String),

    /// Wrapped store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

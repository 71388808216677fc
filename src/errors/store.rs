use redis::RedisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection or command errors from the redis backend
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    /// A stored value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

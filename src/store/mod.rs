//! Key-value storage with store-enforced expiry.
//!
//! Links and rate-limit records both live here. The store offers no
//! transactions and no atomic increment; callers read, decide and write.
//!
//! ## Key patterns
//!
//! ```text
//! <code>                  → LinkEntry JSON (expires after the link TTL)
//! ratelimit:<identity>    → RateRecord JSON (expires with the window)
//! ```

use std::{fmt, str::FromStr, sync::Arc};

use async_trait::async_trait;
use log::info;
#[cfg(test)]
use mockall::automock;
use serde::{de::DeserializeOwned, Serialize};

use crate::config::StoreConfig;
use crate::errors::StoreError;
use crate::utils::Clock;

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Prefix of every rate-limit record key. Link codes never use it.
pub const RATE_KEY_PREFIX: &str = "ratelimit:";

/// Whether `key` belongs to the rate-limit records rather than to links
pub fn is_rate_key(key: &str) -> bool {
    key.starts_with(RATE_KEY_PREFIX)
}

/// Available store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            _ => Err(format!(
                "Invalid store backend: {}. Must be one of: memory, redis",
                s
            )),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Redis => write!(f, "redis"),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads the raw value stored under `key`
    ///
    /// ### Returns
    /// * `Ok(None)` - If the key was never written or its TTL has elapsed
    ///
    /// ### Errors
    /// * `StoreError` - If the backend cannot be reached
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value
    ///
    /// ### Arguments
    /// * `ttl_seconds` - Lifetime of the entry; the store removes it afterwards
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreResult<()>;

    /// Lists every live key
    async fn list(&self) -> StoreResult<Vec<String>>;

    /// Which backend serves this store
    fn backend(&self) -> StoreBackend;
}

impl dyn KvStore {
    /// Reads and decodes a JSON value
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encodes `value` as JSON and writes it with a TTL
    pub async fn put_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> StoreResult<()> {
        let raw = serde_json::to_string(value)?;
        self.put(key, &raw, ttl_seconds).await
    }
}

/// Builds the configured store backend
pub async fn connect(config: &StoreConfig, clock: Arc<dyn Clock>) -> StoreResult<Arc<dyn KvStore>> {
    info!("Initializing {} store", config.backend);

    let store: Arc<dyn KvStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new(clock)),
        StoreBackend::Redis => Arc::new(RedisStore::connect(&config.redis_url).await?),
    };

    Ok(store)
}

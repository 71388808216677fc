use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;

use super::{KvStore, StoreBackend, StoreResult};
use crate::utils::Clock;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at_ms: i64,
}

/// In-process store for local development and tests.
///
/// Expiry is evaluated against the injected clock on every read, so an entry
/// disappears at its deadline even before `purge_expired` drops it.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Drops every entry whose TTL has elapsed, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at_ms > now);
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Purged {} expired entries", removed);
        }
        removed
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = self.clock.now_millis();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at_ms > now)
            .map(|entry| entry.value.clone()))
    }

    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreResult<()> {
        let expires_at_ms = self.clock.now_millis() + (ttl_seconds as i64) * 1000;
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at_ms,
            },
        );
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        let now = self.clock.now_millis();
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.expires_at_ms > now)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}

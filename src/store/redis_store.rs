use async_trait::async_trait;
use log::{debug, info, warn};
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use super::{KvStore, StoreBackend, StoreResult};

/// Keys fetched per SCAN round trip when listing
const SCAN_BATCH: usize = 100;

/// Redis-backed store. Expiry is delegated to redis via `SET ... EX`.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Opens a managed connection that reconnects on failure
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = Client::open(url).map_err(|e| {
            warn!("Invalid redis connection string: {}", e);
            e
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            warn!("Failed to connect to redis: {}", e);
            e
        })?;

        info!("Successfully connected to redis");
        Ok(Self { manager })
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn.set_ex(key, value, ttl_seconds).await?;
        debug!("Stored key '{}' with ttl {}s", key, ttl_seconds);
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        let mut conn = self.manager.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Redis
    }
}

//! Fixed-window rate limiting on top of the shared key-value store.
//!
//! Each identity has at most one `RateRecord` under `ratelimit:<identity>`.
//! The record is read, judged and rewritten without any atomicity, so
//! concurrent bursts from one identity can be admitted slightly past the
//! limit.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::RateLimitConfig;
use crate::errors::StoreError;
use crate::models::RateRecord;
use crate::store::{KvStore, RATE_KEY_PREFIX};
use crate::utils::Clock;

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Request admitted and recorded
    Admit {
        /// Requests left in the current window
        remaining: u32,
    },
    /// Window exhausted; nothing was written
    Reject {
        /// Whole seconds until the window ends
        retry_after_seconds: u64,
    },
}

impl RateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, RateDecision::Admit { .. })
    }
}

pub struct RateLimiter {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, config: RateLimitConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Store key holding the record for `identity`
    pub fn record_key(identity: &str) -> String {
        format!("{}{}", RATE_KEY_PREFIX, identity)
    }

    /// Decides whether `identity` may make another request and records it
    /// when admitted.
    pub async fn check_and_record(&self, identity: &str) -> Result<RateDecision, StoreError> {
        let key = Self::record_key(identity);
        let now = self.clock.now_millis();
        let max = self.config.max_requests;

        // An unreadable record is replaced by a fresh window
        let record = match self.store.get_json::<RateRecord>(&key).await {
            Ok(record) => record,
            Err(StoreError::Serialization(e)) => {
                warn!("Discarding unreadable rate record for '{}': {}", identity, e);
                None
            }
            Err(e) => return Err(e),
        };

        let decision = match record.filter(|r| r.is_open(now)) {
            // Fresh: no record or the previous window has ended
            None => {
                let record = RateRecord::open(now, self.config.window_seconds);
                self.store
                    .put_json(&key, &record, self.config.window_seconds)
                    .await?;
                RateDecision::Admit {
                    remaining: max.saturating_sub(1),
                }
            }
            // Exhausted
            Some(record) if record.count >= max => {
                let retry_after_seconds = record.seconds_remaining(now);
                info!(
                    "Rate limit exceeded for '{}' ({} requests, retry in {}s)",
                    identity, record.count, retry_after_seconds
                );
                RateDecision::Reject {
                    retry_after_seconds,
                }
            }
            // Active
            Some(mut record) => {
                record.count += 1;
                let ttl = record
                    .seconds_remaining(now)
                    .max(self.config.ttl_floor_seconds);
                self.store.put_json(&key, &record, ttl).await?;
                RateDecision::Admit {
                    remaining: max.saturating_sub(record.count),
                }
            }
        };

        debug!("Rate limit decision for '{}': {:?}", identity, decision);
        Ok(decision)
    }
}

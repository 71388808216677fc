// src/services/link.rs - Code allocation and resolution
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::config::LinkConfig;
use crate::errors::ServiceError;
use crate::models::{AllocatedLink, LinkEntry};
use crate::store::{is_rate_key, KvStore};
use crate::utils::{code_generator, Clock};

type Result<T> = std::result::Result<T, ServiceError>;

#[async_trait]
pub trait LinkServiceTrait {
    /// Stores `payload` under a fresh code (or `preferred_code` verbatim)
    ///
    /// ### Returns
    /// * `AllocatedLink` - The code and its absolute expiry in epoch millis
    ///
    /// ### Errors
    /// * `ServiceError::InvalidPayload` - If the payload is blank
    /// * `ServiceError::InvalidCode` - If `preferred_code` is in the rate-limit key namespace
    /// * `ServiceError::StorageExhausted` - If no free code was found within the attempt bound
    /// * `ServiceError::Store` - If a store read or the final write fails
    async fn allocate(&self, payload: &str, preferred_code: Option<&str>) -> Result<AllocatedLink>;

    /// Looks up the payload stored under `code`
    ///
    /// ### Errors
    /// * `ServiceError::NotFound` - If no live entry exists for the code
    async fn resolve(&self, code: &str) -> Result<LinkEntry>;
}

pub struct LinkService {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    config: LinkConfig,
}

impl LinkService {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, config: LinkConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Draws candidates until one has no live entry. The check and the later
    /// write are not atomic, so two callers can still pick the same code.
    async fn find_free_code(&self) -> Result<String> {
        for attempt in 1..=self.config.max_attempts {
            let candidate = code_generator::generate_code(self.config.code_format);
            if self.store.get(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            debug!("Code '{}' is taken (attempt {})", candidate, attempt);
        }

        warn!(
            "No free code found after {} attempts",
            self.config.max_attempts
        );
        Err(ServiceError::StorageExhausted(format!(
            "Failed to generate a unique code after {} attempts",
            self.config.max_attempts
        )))
    }

    async fn lookup(&self, code: &str) -> Result<Option<LinkEntry>> {
        Ok(self.store.get_json::<LinkEntry>(code).await?)
    }
}

/// Percent-decodes a code taken from a URL path. Undecodable input is used
/// as-is.
pub fn normalize_code(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

#[async_trait]
impl LinkServiceTrait for LinkService {
    async fn allocate(&self, payload: &str, preferred_code: Option<&str>) -> Result<AllocatedLink> {
        if payload.trim().is_empty() {
            return Err(ServiceError::InvalidPayload("Missing payload".to_string()));
        }

        // A custom code is taken as-is; an existing entry under it is overwritten
        let code = match preferred_code.filter(|c| !c.is_empty()) {
            Some(custom) if is_rate_key(custom) => {
                warn!("Refused custom code in the rate-limit namespace: '{}'", custom);
                return Err(ServiceError::InvalidCode(
                    "Custom code uses a reserved prefix".to_string(),
                ));
            }
            Some(custom) => custom.to_string(),
            None => self.find_free_code().await?,
        };

        let entry = LinkEntry {
            payload: payload.to_string(),
        };
        let ttl = self.config.ttl_seconds;

        self.store
            .put_json(&code, &entry, ttl)
            .await
            .inspect_err(|e| warn!("Failed to save code '{}': {}", code, e))?;

        // Measured after the write so the reported expiry never precedes the store's
        let expires_at = self.clock.now_millis() + (ttl as i64) * 1000;
        info!("Allocated code '{}' (ttl {}s)", code, ttl);

        Ok(AllocatedLink { code, expires_at })
    }

    async fn resolve(&self, code: &str) -> Result<LinkEntry> {
        let code = normalize_code(code);

        // Rate-limit records share the store but are never links
        if is_rate_key(&code) {
            return Err(ServiceError::NotFound("Not found or expired".to_string()));
        }

        if let Some(entry) = self.lookup(&code).await? {
            return Ok(entry);
        }

        if self.config.uppercase_fallback {
            let upper = code.to_uppercase();
            if upper != code {
                if let Some(entry) = self.lookup(&upper).await? {
                    debug!("Resolved '{}' via uppercase form '{}'", code, upper);
                    return Ok(entry);
                }
            }
        }

        Err(ServiceError::NotFound("Not found or expired".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::store::{MemoryStore, MockKvStore, StoreBackend};
    use crate::utils::code_generator::{is_generated_code, CodeFormat};
    use crate::utils::ManualClock;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::time::Duration;

    const START: i64 = 1_700_000_000_000;

    fn memory_service(config: LinkConfig) -> (LinkService, Arc<MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let service = LinkService::new(store.clone(), clock.clone(), config);
        (service, store, clock)
    }

    fn mock_service(mock: MockKvStore, config: LinkConfig) -> LinkService {
        LinkService::new(Arc::new(mock), Arc::new(ManualClock::new(START)), config)
    }

    #[tokio::test]
    async fn test_allocate_then_resolve_round_trips() {
        let (service, _, _) = memory_service(LinkConfig::default());

        let link = service.allocate("secret-payload", None).await.unwrap();
        assert!(is_generated_code(&link.code, CodeFormat::Compact), "{}", link.code);
        assert_eq!(link.expires_at, START + 300_000);

        let entry = service.resolve(&link.code).await.unwrap();
        assert_eq!(entry.payload, "secret-payload");

        // Reads are idempotent
        let again = service.resolve(&link.code).await.unwrap();
        assert_eq!(again, entry);
    }

    #[tokio::test]
    async fn test_resolve_after_ttl_is_not_found() {
        let (service, _, clock) = memory_service(LinkConfig::default());
        let link = service.allocate("secret-payload", None).await.unwrap();

        clock.advance(Duration::from_secs(299));
        assert!(service.resolve(&link.code).await.is_ok());

        clock.advance(Duration::from_secs(1));
        assert!(matches!(
            service.resolve(&link.code).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_unknown_code_is_not_found() {
        let (service, _, _) = memory_service(LinkConfig::default());
        assert!(matches!(
            service.resolve("Z99999").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_payload_is_rejected() {
        let (service, store, _) = memory_service(LinkConfig::default());

        assert!(matches!(
            service.allocate("", None).await,
            Err(ServiceError::InvalidPayload(_))
        ));
        assert!(matches!(
            service.allocate("  ", Some("MINE")).await,
            Err(ServiceError::InvalidPayload(_))
        ));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_separated_format() {
        let config = LinkConfig {
            code_format: CodeFormat::Separated(':'),
            ..Default::default()
        };
        let (service, _, _) = memory_service(config);

        let link = service.allocate("payload", None).await.unwrap();
        assert!(is_generated_code(&link.code, CodeFormat::Separated(':')), "{}", link.code);
    }

    #[tokio::test]
    async fn test_generated_code_skips_live_entries() {
        let mut mock = MockKvStore::new();
        let mut seq = Sequence::new();

        // The first two candidates are taken, the third is free
        mock.expect_get()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(r#"{"payload":"existing"}"#.to_string())));
        mock.expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        mock.expect_put()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|_, value, ttl| value == r#"{"payload":"fresh"}"# && *ttl == 300)
            .returning(|_, _, _| Ok(()));

        let service = mock_service(mock, LinkConfig::default());
        let link = service.allocate("fresh", None).await.unwrap();
        assert!(is_generated_code(&link.code, CodeFormat::Compact));
    }

    #[tokio::test]
    async fn test_generated_code_differs_from_prepopulated_entries() {
        let (service, store, _) = memory_service(LinkConfig::default());

        // Occupy every code with letters A..=Y for one digit block, then
        // check that allocation never lands on an occupied key
        let mut occupied = Vec::new();
        for letter in b'A'..=b'Y' {
            let code = format!("{}{}", letter as char, 12345);
            store.put(&code, r#"{"payload":"old"}"#, 300).await.unwrap();
            occupied.push(code);
        }

        for _ in 0..50 {
            let link = service.allocate("new", None).await.unwrap();
            assert!(!occupied.contains(&link.code));
        }
        for code in &occupied {
            assert_eq!(service.resolve(code).await.unwrap().payload, "old");
        }
    }

    #[tokio::test]
    async fn test_generation_gives_up_after_max_attempts() {
        let mut mock = MockKvStore::new();
        mock.expect_get()
            .times(3)
            .returning(|_| Ok(Some(r#"{"payload":"taken"}"#.to_string())));
        mock.expect_put().never();

        let config = LinkConfig {
            max_attempts: 3,
            ..Default::default()
        };
        let service = mock_service(mock, config);

        assert!(matches!(
            service.allocate("payload", None).await,
            Err(ServiceError::StorageExhausted(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_code_is_used_without_lookup() {
        let mut mock = MockKvStore::new();
        mock.expect_get().never();
        mock.expect_put()
            .with(eq("MINE"), eq(r#"{"payload":"p"}"#), eq(300u64))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = mock_service(mock, LinkConfig::default());
        let link = service.allocate("p", Some("MINE")).await.unwrap();
        assert_eq!(link.code, "MINE");
    }

    #[tokio::test]
    async fn test_empty_custom_code_falls_back_to_generation() {
        let (service, _, _) = memory_service(LinkConfig::default());
        let link = service.allocate("p", Some("")).await.unwrap();
        assert!(is_generated_code(&link.code, CodeFormat::Compact));
    }

    #[tokio::test]
    async fn test_colliding_custom_code_overwrites_previous_entry() {
        let (service, _, _) = memory_service(LinkConfig::default());

        service.allocate("first", Some("SHARED")).await.unwrap();
        service.allocate("second", Some("SHARED")).await.unwrap();

        assert_eq!(service.resolve("SHARED").await.unwrap().payload, "second");
    }

    #[tokio::test]
    async fn test_write_failure_is_storage_error() {
        let mut mock = MockKvStore::new();
        mock.expect_get().returning(|_| Ok(None));
        mock.expect_put()
            .times(1)
            .returning(|_, _, _| Err(StoreError::Unavailable("write refused".to_string())));
        mock.expect_backend().return_const(StoreBackend::Memory);

        let service = mock_service(mock, LinkConfig::default());
        assert!(matches!(
            service.allocate("payload", None).await,
            Err(ServiceError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_read_failure_during_collision_check_is_surfaced() {
        let mut mock = MockKvStore::new();
        mock.expect_get()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("read refused".to_string())));
        mock.expect_put().never();

        let service = mock_service(mock, LinkConfig::default());
        assert!(matches!(
            service.allocate("payload", None).await,
            Err(ServiceError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_reserved_custom_code_is_refused() {
        let mut mock = MockKvStore::new();
        mock.expect_get().never();
        mock.expect_put().never();

        let service = mock_service(mock, LinkConfig::default());
        assert!(matches!(
            service.allocate("p", Some("ratelimit:9.9.9.9")).await,
            Err(ServiceError::InvalidCode(_))
        ));
    }

    #[tokio::test]
    async fn test_rate_records_do_not_resolve() {
        let (service, store, _) = memory_service(LinkConfig::default());
        store
            .put("ratelimit:9.9.9.9", r#"{"count":1,"expires":1}"#, 60)
            .await
            .unwrap();

        for code in ["ratelimit:9.9.9.9", "ratelimit%3A9.9.9.9"] {
            assert!(matches!(
                service.resolve(code).await,
                Err(ServiceError::NotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_uppercase_fallback() {
        let (service, _, _) = memory_service(LinkConfig::default());
        service.allocate("payload", Some("K12345")).await.unwrap();

        assert_eq!(service.resolve("k12345").await.unwrap().payload, "payload");
    }

    #[tokio::test]
    async fn test_uppercase_fallback_disabled() {
        let config = LinkConfig {
            uppercase_fallback: false,
            ..Default::default()
        };
        let (service, _, _) = memory_service(config);
        service.allocate("payload", Some("K12345")).await.unwrap();

        assert!(matches!(
            service.resolve("k12345").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_exact_match_wins_over_uppercase() {
        let (service, _, _) = memory_service(LinkConfig::default());
        service.allocate("lower", Some("abc")).await.unwrap();
        service.allocate("upper", Some("ABC")).await.unwrap();

        assert_eq!(service.resolve("abc").await.unwrap().payload, "lower");
    }

    #[tokio::test]
    async fn test_resolve_percent_decodes_code() {
        let (service, _, _) = memory_service(LinkConfig::default());
        service.allocate("payload", Some("A:12345")).await.unwrap();

        assert_eq!(service.resolve("A%3A12345").await.unwrap().payload, "payload");
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("A%3A12345"), "A:12345");
        assert_eq!(normalize_code("plain"), "plain");
        // Invalid UTF-8 after decoding is kept raw
        assert_eq!(normalize_code("%FF"), "%FF");
    }
}

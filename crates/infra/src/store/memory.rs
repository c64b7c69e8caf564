//! In-process credential store with per-key TTL, backed by moka

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use shipgate_core::CredentialStore;
use shipgate_domain::{Result, ShipgateError};
use tracing::debug;

/// Default max capacity; the credential uses two keys.
pub const DEFAULT_STORE_CAPACITY: u64 = 64;

#[derive(Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expire each entry after the TTL it was written with.
struct WriteTtl;

impl Expiry<String, Entry> for WriteTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Credential store local to this process.
///
/// Each instance refreshes independently; use the Redis store to share one
/// credential across instances.
pub struct InMemoryCredentialStore {
    cache: Cache<String, Entry>,
    closed: AtomicBool,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_STORE_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).expire_after(WriteTtl).build();
        Self { cache, closed: AtomicBool::new(false) }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ShipgateError::Store("credential store is closed".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_open()?;
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.ensure_open()?;
        if ttl.is_zero() {
            return Err(ShipgateError::InvalidInput(format!("ttl for '{key}' must be positive")));
        }
        self.cache.insert(key.to_string(), Entry { value: value.to_string(), ttl }).await;
        debug!(key, ttl_secs = ttl.as_secs(), "stored credential key");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        self.cache.invalidate_all();
        Ok(())
    }
}

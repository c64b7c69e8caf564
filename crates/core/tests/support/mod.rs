//! Shared fakes for `shipgate-core` integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shipgate_common::MockClock;
use shipgate_core::{CarrierAuthenticator, CredentialManager, CredentialSettings, CredentialStore};
use shipgate_domain::{CredentialKeys, Result, ShipgateError};
use tokio::time::Instant;

pub const PREFIX: &str = "test:carrier:";

/// Key/value store recording the TTL of every write.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Duration)>>,
    fail_reads: AtomicBool,
    failing_writes: AtomicU32,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn keys() -> CredentialKeys {
        CredentialKeys::from_prefix(PREFIX)
    }

    pub fn seed_credential(&self, token: &str, expires_at: DateTime<Utc>) {
        let keys = Self::keys();
        let ttl = Duration::from_secs(820_800);
        let mut entries = self.entries.lock();
        entries.insert(keys.token, (token.to_string(), ttl));
        entries.insert(keys.expiry, (expires_at.timestamp().to_string(), ttl));
    }

    pub fn seed_raw(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), (value.to_string(), Duration::from_secs(60)));
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).map(|(value, _)| value.clone())
    }

    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.entries.lock().get(key).map(|(_, ttl)| *ttl)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Fail the next `count` writes.
    pub fn fail_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ShipgateError::Store("connection refused".into()));
        }
        Ok(self.value(key))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let failing = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ShipgateError::Store("write rejected".into()));
        }
        self.entries.lock().insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Carrier login that plays back scripted results, then issues
/// `token-<n>` for every further call.
#[derive(Default)]
pub struct ScriptedLogin {
    script: Mutex<VecDeque<Result<String>>>,
    calls: AtomicU32,
    call_times: Mutex<Vec<Instant>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedLogin {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_script(results: Vec<Result<String>>) -> Arc<Self> {
        let login = Self::default();
        *login.script.lock() = results.into();
        Arc::new(login)
    }

    /// Make every login take `delay` (tokio time).
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().clone()
    }
}

#[async_trait]
impl CarrierAuthenticator for ScriptedLogin {
    async fn login(&self) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.call_times.lock().push(Instant::now());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(format!("token-{n}")))
    }
}

pub fn settings() -> CredentialSettings {
    CredentialSettings { keys: MemoryStore::keys(), ..CredentialSettings::default() }
}

pub fn manager(
    store: &Arc<MemoryStore>,
    login: &Arc<ScriptedLogin>,
    clock: &MockClock,
) -> CredentialManager {
    CredentialManager::new(
        Arc::clone(store) as Arc<dyn CredentialStore>,
        Arc::clone(login) as Arc<dyn CarrierAuthenticator>,
        Arc::new(clock.clone()),
        settings(),
    )
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

//! Shared carrier credential with single-flight refresh
//!
//! The credential lives in a [`CredentialStore`] shared by every instance;
//! this manager only coordinates callers inside one process. A refresh runs
//! in its own task and every concurrent caller awaits the same shared
//! handle, so a cancelled caller never aborts the login it joined.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use shipgate_common::resilience::policies::PredicateRetry;
use shipgate_common::{BackoffStrategy, Clock, RetryConfig, RetryExecutor};
use shipgate_domain::constants::{
    DEFAULT_LOGIN_BACKOFF_MS, DEFAULT_LOGIN_MAX_ATTEMPTS, DEFAULT_LOGIN_TIMEOUT_SECS,
    DEFAULT_REFRESH_BUFFER_SECS, DEFAULT_STORE_PREFIX, DEFAULT_STORE_TIMEOUT_SECS,
    DEFAULT_TOKEN_CACHE_TTL_SECS, DEFAULT_TOKEN_LIFETIME_SECS,
};
use shipgate_domain::{
    Config, Credential, CredentialKeys, Freshness, RefreshEvent, ShipgateError, TokenStatus,
};
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, error, info, instrument, warn};

use super::error::CredentialError;
use crate::credential_ports::{CarrierAuthenticator, CredentialStore};

const EVENT_CHANNEL_CAPACITY: usize = 16;
const MAX_LOGIN_BACKOFF: Duration = Duration::from_secs(60);

type RefreshResult = Result<Credential, CredentialError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// Tuning for the credential lifecycle
#[derive(Debug, Clone)]
pub struct CredentialSettings {
    /// Validity of a freshly issued token
    pub lifetime: Duration,
    /// TTL applied to both store keys; shorter than `lifetime`
    pub cache_ttl: Duration,
    /// Window before expiry in which a valid token is refreshed proactively
    pub refresh_buffer: Duration,
    pub login_timeout: Duration,
    pub store_timeout: Duration,
    pub retry: RetryConfig,
    pub keys: CredentialKeys,
}

impl CredentialSettings {
    pub fn from_config(config: &Config) -> Self {
        let creds = &config.credentials;
        Self {
            lifetime: Duration::from_secs(creds.lifetime_secs),
            cache_ttl: Duration::from_secs(creds.cache_ttl_secs),
            refresh_buffer: Duration::from_secs(creds.refresh_buffer_secs),
            login_timeout: config.carrier.login_timeout(),
            store_timeout: config.store.timeout(),
            retry: RetryConfig::new(
                creds.max_login_attempts,
                BackoffStrategy::doubling(creds.login_backoff(), MAX_LOGIN_BACKOFF),
            ),
            keys: CredentialKeys::from_prefix(&config.store.key_prefix),
        }
    }
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            lifetime: Duration::from_secs(DEFAULT_TOKEN_LIFETIME_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_TOKEN_CACHE_TTL_SECS),
            refresh_buffer: Duration::from_secs(DEFAULT_REFRESH_BUFFER_SECS),
            login_timeout: Duration::from_secs(DEFAULT_LOGIN_TIMEOUT_SECS),
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
            retry: RetryConfig::new(
                DEFAULT_LOGIN_MAX_ATTEMPTS,
                BackoffStrategy::doubling(
                    Duration::from_millis(DEFAULT_LOGIN_BACKOFF_MS),
                    MAX_LOGIN_BACKOFF,
                ),
            ),
            keys: CredentialKeys::from_prefix(DEFAULT_STORE_PREFIX),
        }
    }
}

/// What a periodic expiry check did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshCheck {
    /// More than the refresh buffer remains
    NotDue,
    /// The token was inside the buffer and has been refreshed
    Refreshed,
    /// Nothing stored, or already expired; the next caller refreshes inline
    Skipped,
}

struct StoredToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct RefreshState {
    pending: Option<(u64, SharedRefresh)>,
    generation: u64,
}

struct Inner {
    store: Arc<dyn CredentialStore>,
    authenticator: Arc<dyn CarrierAuthenticator>,
    clock: Arc<dyn Clock>,
    settings: CredentialSettings,
    refresh: Mutex<RefreshState>,
    events: broadcast::Sender<RefreshEvent>,
}

/// Owns the lifecycle of the one shared carrier bearer token.
///
/// Cheap to clone; clones share the refresh state.
#[derive(Clone)]
pub struct CredentialManager {
    inner: Arc<Inner>,
}

impl CredentialManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        authenticator: Arc<dyn CarrierAuthenticator>,
        clock: Arc<dyn Clock>,
        settings: CredentialSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                authenticator,
                clock,
                settings,
                refresh: Mutex::new(RefreshState::default()),
                events,
            }),
        }
    }

    pub fn settings(&self) -> &CredentialSettings {
        &self.inner.settings
    }

    /// Receive a [`RefreshEvent`] after every successful refresh.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.inner.events.subscribe()
    }

    /// Whether a refresh is currently in flight in this process.
    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.lock().pending.is_some()
    }

    /// Return a usable bearer token.
    ///
    /// Without `force_refresh`, a stored token with more than the refresh
    /// buffer left is returned as is; one inside the buffer is returned
    /// while a background refresh starts. Missing or expired tokens (and
    /// store read failures) fall through to a synchronous refresh, which
    /// joins any refresh already in flight.
    ///
    /// # Errors
    /// `CredentialError::RefreshFailed` once login attempts are exhausted.
    #[instrument(skip(self))]
    pub async fn get_token(&self, force_refresh: bool) -> Result<String, CredentialError> {
        if !force_refresh {
            match self.read_stored().await {
                Ok(Some(stored)) => {
                    let remaining = self.seconds_until(stored.expires_at);
                    match Freshness::classify(remaining, self.buffer_secs()) {
                        Freshness::Fresh => return Ok(stored.value),
                        Freshness::ExpiringSoon => {
                            debug!(remaining_secs = remaining, "credential expiring soon");
                            self.refresh_in_background();
                            return Ok(stored.value);
                        }
                        Freshness::Expired => debug!("stored credential has expired"),
                    }
                }
                Ok(None) => debug!("no stored credential"),
                Err(err) => warn!(error = %err, "credential store read failed, refreshing"),
            }
        }

        self.join_or_start_refresh().await.map(|credential| credential.value)
    }

    /// Snapshot of the stored credential. Never refreshes and never fails;
    /// an unreachable store yields a degraded status carrying the error.
    pub async fn status(&self) -> TokenStatus {
        match self.read_stored().await {
            Ok(Some(stored)) => TokenStatus::evaluate(
                stored.expires_at,
                self.inner.clock.now_utc(),
                self.buffer_secs(),
            ),
            Ok(None) => TokenStatus::missing(),
            Err(err) => {
                warn!(error = %err, "credential status unavailable");
                TokenStatus::unavailable(err.to_string())
            }
        }
    }

    /// Refresh the stored token if it is inside the refresh buffer but not
    /// yet expired. Used by the periodic refresher.
    ///
    /// # Errors
    /// Store read failures and refresh failures.
    pub async fn refresh_if_expiring(&self) -> Result<RefreshCheck, CredentialError> {
        let Some(stored) = self.read_stored().await.map_err(CredentialError::Store)? else {
            return Ok(RefreshCheck::Skipped);
        };

        match Freshness::classify(self.seconds_until(stored.expires_at), self.buffer_secs()) {
            Freshness::Fresh => Ok(RefreshCheck::NotDue),
            Freshness::Expired => Ok(RefreshCheck::Skipped),
            Freshness::ExpiringSoon => {
                info!("credential expiring soon, refreshing");
                self.join_or_start_refresh().await?;
                Ok(RefreshCheck::Refreshed)
            }
        }
    }

    fn refresh_in_background(&self) {
        // The refresh task runs to completion whether or not anyone awaits it.
        drop(self.join_or_start_refresh());
    }

    fn join_or_start_refresh(&self) -> SharedRefresh {
        let (sender, receiver) = oneshot::channel();

        let (generation, shared) = {
            let mut state = self.inner.refresh.lock();
            if let Some((_, pending)) = &state.pending {
                debug!("joining in-flight credential refresh");
                return pending.clone();
            }

            state.generation += 1;
            let shared = async move {
                receiver.await.unwrap_or_else(|_| {
                    Err(CredentialError::Interrupted("refresh task dropped".to_string()))
                })
            }
            .boxed()
            .shared();
            state.pending = Some((state.generation, shared.clone()));
            (state.generation, shared)
        };

        let manager = self.clone();
        tokio::spawn(async move {
            let result = {
                let _guard = PendingGuard { manager: &manager, generation };
                manager.run_refresh().await
            };
            // Joiners may all have gone away.
            let _ = sender.send(result);
        });

        shared
    }

    fn finish_refresh(&self, generation: u64) {
        let mut state = self.inner.refresh.lock();
        if matches!(&state.pending, Some((pending, _)) if *pending == generation) {
            state.pending = None;
        }
    }

    #[instrument(skip(self))]
    async fn run_refresh(&self) -> RefreshResult {
        info!("refreshing carrier credential");

        let policy = PredicateRetry::new(|err: &ShipgateError, _| err.is_transient());
        let executor = RetryExecutor::new(self.inner.settings.retry.clone(), policy);
        let outcome = executor.execute_with_outcome(|attempt| self.login_and_store(attempt)).await;

        match outcome.result {
            Ok(credential) => {
                info!(
                    attempts = outcome.attempts,
                    expires_at = %credential.expires_at,
                    "carrier credential refreshed"
                );
                // Having no subscribers is not an error.
                let _ = self.inner.events.send(RefreshEvent {
                    issued_at: credential.issued_at,
                    expires_at: credential.expires_at,
                    attempts: outcome.attempts,
                });
                Ok(credential)
            }
            Err(err) => {
                let attempts = err.attempts();
                let message = err.to_string();
                let last_error = err.into_source().unwrap_or(ShipgateError::Config(message));
                error!(attempts, error = %last_error, "carrier credential refresh failed");
                Err(CredentialError::RefreshFailed { attempts, last_error })
            }
        }
    }

    async fn login_and_store(&self, attempt: u32) -> shipgate_domain::Result<Credential> {
        let settings = &self.inner.settings;
        debug!(attempt, max_attempts = settings.retry.max_attempts, "carrier login attempt");

        let value = tokio::time::timeout(settings.login_timeout, self.inner.authenticator.login())
            .await
            .map_err(|_| {
                ShipgateError::Network(format!(
                    "carrier login timed out after {}s",
                    settings.login_timeout.as_secs()
                ))
            })??;

        let credential =
            Credential::issue(value, self.inner.clock.now_utc(), settings.lifetime.as_secs());
        self.persist(&credential).await?;
        Ok(credential)
    }

    async fn persist(&self, credential: &Credential) -> shipgate_domain::Result<()> {
        let keys = &self.inner.settings.keys;
        let ttl = self.inner.settings.cache_ttl;
        let expiry = credential.expires_at.timestamp().to_string();

        futures::try_join!(
            self.store_call("write token", self.inner.store.set_with_ttl(&keys.token, &credential.value, ttl)),
            self.store_call("write expiry", self.inner.store.set_with_ttl(&keys.expiry, &expiry, ttl)),
        )?;
        Ok(())
    }

    async fn read_stored(&self) -> shipgate_domain::Result<Option<StoredToken>> {
        let keys = &self.inner.settings.keys;
        let (token, expiry) = futures::try_join!(
            self.store_call("read token", self.inner.store.get(&keys.token)),
            self.store_call("read expiry", self.inner.store.get(&keys.expiry)),
        )?;

        let (Some(value), Some(expiry)) = (token, expiry) else {
            return Ok(None);
        };

        match parse_expiry(&expiry) {
            Some(expires_at) => Ok(Some(StoredToken { value, expires_at })),
            None => {
                warn!(raw = %expiry, "ignoring unparseable credential expiry");
                Ok(None)
            }
        }
    }

    async fn store_call<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = shipgate_domain::Result<T>>,
    ) -> shipgate_domain::Result<T> {
        let limit = self.inner.settings.store_timeout;
        tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
            Err(ShipgateError::Store(format!(
                "{operation} timed out after {}ms",
                limit.as_millis()
            )))
        })
    }

    fn seconds_until(&self, expires_at: DateTime<Utc>) -> i64 {
        (expires_at - self.inner.clock.now_utc()).num_seconds()
    }

    fn buffer_secs(&self) -> u64 {
        self.inner.settings.refresh_buffer.as_secs()
    }
}

/// Clears the pending slot when the refresh task ends, including by panic
/// or runtime shutdown.
struct PendingGuard<'a> {
    manager: &'a CredentialManager,
    generation: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.manager.finish_refresh(self.generation);
    }
}

/// Expiry is stored as whole unix seconds.
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let secs = raw.trim().parse::<i64>().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

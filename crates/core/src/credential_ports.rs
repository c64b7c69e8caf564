//! Port interfaces for credential persistence and carrier login
//!
//! These traits define the boundaries between the credential lifecycle
//! and infrastructure implementations.

use std::time::Duration;

use async_trait::async_trait;
use shipgate_domain::Result;

/// Shared key/value store holding the credential across instances
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read a key; `None` when absent or evicted
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a key that the store evicts after `ttl`
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Release the underlying connection
    async fn close(&self) -> Result<()>;
}

/// Obtains a fresh bearer token from the carrier.
///
/// Implementations make exactly one login attempt; retry and backoff are
/// the caller's concern. Rejected credentials must surface as
/// `ShipgateError::Auth` so they are not retried.
#[async_trait]
pub trait CarrierAuthenticator: Send + Sync {
    async fn login(&self) -> Result<String>;
}

//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_LOGIN_BACKOFF_MS, DEFAULT_LOGIN_MAX_ATTEMPTS,
    DEFAULT_LOGIN_TIMEOUT_SECS, DEFAULT_REFRESH_BUFFER_SECS, DEFAULT_REFRESH_CHECK_INTERVAL_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STORE_PREFIX, DEFAULT_STORE_TIMEOUT_SECS,
    DEFAULT_TOKEN_CACHE_TTL_SECS, DEFAULT_TOKEN_LIFETIME_SECS, TRANSPORT_TIMEOUT_GRACE_SECS,
};
use crate::errors::{Result, ShipgateError};

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub carrier: CarrierConfig,
    #[serde(default)]
    pub credentials: CredentialConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Carrier API endpoint and login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierConfig {
    pub base_url: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_login_timeout")]
    pub login_timeout_secs: u64,
}

/// Credential lifecycle tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    pub lifetime_secs: u64,
    pub cache_ttl_secs: u64,
    pub refresh_buffer_secs: u64,
    pub check_interval_secs: u64,
    pub max_login_attempts: u32,
    pub login_backoff_ms: u64,
}

/// Shared credential store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Redis URL; `None` keeps the credential in process memory
    pub url: Option<String>,
    pub key_prefix: String,
    pub timeout_secs: u64,
}

/// Health listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_login_timeout() -> u64 {
    DEFAULT_LOGIN_TIMEOUT_SECS
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
            cache_ttl_secs: DEFAULT_TOKEN_CACHE_TTL_SECS,
            refresh_buffer_secs: DEFAULT_REFRESH_BUFFER_SECS,
            check_interval_secs: DEFAULT_REFRESH_CHECK_INTERVAL_SECS,
            max_login_attempts: DEFAULT_LOGIN_MAX_ATTEMPTS,
            login_backoff_ms: DEFAULT_LOGIN_BACKOFF_MS,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            key_prefix: DEFAULT_STORE_PREFIX.to_string(),
            timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: DEFAULT_BIND_ADDR.to_string() }
    }
}

impl CarrierConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    /// Backstop timeout for the HTTP client, past both per-attempt deadlines.
    pub fn transport_timeout(&self) -> Duration {
        let longest = self.request_timeout_secs.max(self.login_timeout_secs);
        Duration::from_secs(longest + TRANSPORT_TIMEOUT_GRACE_SECS)
    }
}

impl CredentialConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn login_backoff(&self) -> Duration {
        Duration::from_millis(self.login_backoff_ms)
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Check cross-field invariants that serde cannot express.
    ///
    /// # Errors
    /// Returns `ShipgateError::Config` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.carrier.base_url.trim().is_empty() {
            return Err(ShipgateError::Config("carrier base_url must not be empty".into()));
        }
        if self.carrier.request_timeout_secs == 0 || self.carrier.login_timeout_secs == 0 {
            return Err(ShipgateError::Config("carrier timeouts must be positive".into()));
        }

        let creds = &self.credentials;
        if creds.cache_ttl_secs == 0 || creds.cache_ttl_secs >= creds.lifetime_secs {
            return Err(ShipgateError::Config(format!(
                "cache_ttl_secs ({}) must be positive and shorter than lifetime_secs ({})",
                creds.cache_ttl_secs, creds.lifetime_secs
            )));
        }
        if creds.refresh_buffer_secs >= creds.lifetime_secs {
            return Err(ShipgateError::Config(format!(
                "refresh_buffer_secs ({}) must be shorter than lifetime_secs ({})",
                creds.refresh_buffer_secs, creds.lifetime_secs
            )));
        }
        if creds.max_login_attempts == 0 {
            return Err(ShipgateError::Config("max_login_attempts must be at least 1".into()));
        }
        if creds.check_interval_secs == 0 {
            return Err(ShipgateError::Config("check_interval_secs must be positive".into()));
        }
        if self.store.timeout_secs == 0 {
            return Err(ShipgateError::Config("store timeout_secs must be positive".into()));
        }

        Ok(())
    }
}

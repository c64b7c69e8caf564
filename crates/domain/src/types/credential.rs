//! Carrier credential and its observable status

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{EXPIRY_KEY_SUFFIX, TOKEN_KEY_SUFFIX};

/// The shared bearer token plus its issuance metadata.
///
/// A credential is replaced wholesale on every refresh, never patched.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Create a credential that expires `lifetime_secs` after `issued_at`.
    pub fn issue(value: String, issued_at: DateTime<Utc>, lifetime_secs: u64) -> Self {
        let lifetime = Duration::seconds(i64::try_from(lifetime_secs).unwrap_or(i64::MAX));
        Self { value, issued_at, expires_at: issued_at + lifetime }
    }

    /// Whole seconds until expiry; negative once expired.
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds()
    }
}

// Token values must never reach logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Where a cached credential sits relative to its refresh window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// More than the refresh buffer remains
    Fresh,
    /// Still valid, but inside the refresh buffer
    ExpiringSoon,
    /// At or past expiry
    Expired,
}

impl Freshness {
    pub fn classify(seconds_until_expiry: i64, refresh_buffer_secs: u64) -> Self {
        let buffer = i64::try_from(refresh_buffer_secs).unwrap_or(i64::MAX);
        if seconds_until_expiry > buffer {
            Self::Fresh
        } else if seconds_until_expiry > 0 {
            Self::ExpiringSoon
        } else {
            Self::Expired
        }
    }
}

/// Store keys holding the token and its expiry (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialKeys {
    pub token: String,
    pub expiry: String,
}

impl CredentialKeys {
    /// `<prefix>token` and `<prefix>token:expiry`
    pub fn from_prefix(prefix: &str) -> Self {
        let token = format!("{prefix}{TOKEN_KEY_SUFFIX}");
        let expiry = format!("{token}{EXPIRY_KEY_SUFFIX}");
        Self { token, expiry }
    }
}

/// Published after every successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshEvent {
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
}

/// Snapshot of the stored credential for health reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub exists: bool,
    pub valid: bool,
    pub needs_refresh: bool,
    pub expires_at: Option<DateTime<Utc>>,
    /// Seconds, clamped at zero
    pub time_until_expiry: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TokenStatus {
    /// No credential in the store.
    pub fn missing() -> Self {
        Self {
            exists: false,
            valid: false,
            needs_refresh: true,
            expires_at: None,
            time_until_expiry: 0,
            error: None,
        }
    }

    /// The store could not be read.
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self { error: Some(error.into()), ..Self::missing() }
    }

    /// Status of a stored credential expiring at `expires_at`.
    pub fn evaluate(
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
        refresh_buffer_secs: u64,
    ) -> Self {
        let remaining = (expires_at - now).num_seconds();
        let freshness = Freshness::classify(remaining, refresh_buffer_secs);

        Self {
            exists: true,
            valid: remaining > 0,
            needs_refresh: freshness != Freshness::Fresh,
            expires_at: Some(expires_at),
            time_until_expiry: remaining.max(0),
            error: None,
        }
    }
}

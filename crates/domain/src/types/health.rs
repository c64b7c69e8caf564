//! Carrier health report derived from the credential status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credential::TokenStatus;

/// Overall carrier integration state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
    /// The credential store could not be queried
    Error,
}

/// Health payload returned to monitoring endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierHealth {
    pub status: HealthState,
    pub token_exists: bool,
    pub token_valid: bool,
    pub needs_refresh: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub time_until_expiry: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CarrierHealth {
    pub fn from_token_status(status: &TokenStatus) -> Self {
        let state = if status.error.is_some() {
            HealthState::Error
        } else if status.valid {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        };

        Self {
            status: state,
            token_exists: status.exists,
            token_valid: status.valid,
            needs_refresh: status.needs_refresh,
            expires_at: status.expires_at,
            time_until_expiry: status.time_until_expiry,
            error: status.error.clone(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthState::Healthy
    }

    /// 200 when healthy, 503 otherwise
    pub fn http_status(&self) -> u16 {
        if self.is_healthy() {
            200
        } else {
            503
        }
    }
}

//! Error types used throughout the gateway

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Shipgate
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ShipgateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Credential store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShipgateError {
    /// Whether a login attempt that failed with this error may be retried.
    ///
    /// Rejected credentials and bad configuration will fail the same way on
    /// every attempt; everything else (transport, carrier 5xx, store hiccups)
    /// is worth another try.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Auth(_) | Self::Config(_) | Self::InvalidInput(_))
    }
}

/// Result type alias for Shipgate operations
pub type Result<T> = std::result::Result<T, ShipgateError>;

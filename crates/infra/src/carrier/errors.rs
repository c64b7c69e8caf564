//! Carrier gateway error types
//!
//! Classifies carrier failures and maps them onto the client-facing status
//! codes used by the HTTP layer.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use shipgate_core::CredentialError;
use shipgate_domain::constants::AUTH_FAILURE_PHRASES;
use thiserror::Error;

const MAX_MESSAGE_LEN: usize = 512;

/// Broad classes of gateway failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A credential could not be obtained (refresh exhausted)
    Credential,
    /// The carrier rejected the bearer token even after a refresh
    Authentication,
    /// The carrier answered with a business or validation failure
    Carrier,
    /// Network failure or timeout talking to the carrier
    Transport,
    /// Malformed request input or unparseable carrier response
    Protocol,
}

/// Carrier operations, used as error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    RateCalculation,
    OrderCreation,
    CourierAssignment,
    PickupGeneration,
    Tracking,
    ShipmentCancellation,
    ManifestGeneration,
    LabelDownload,
    InvoiceDownload,
    ShipmentDetails,
    ReturnOrderCreation,
    PickupLocationCreation,
    PickupLocationUpdate,
    PickupLocationDeletion,
}

impl OperationKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::RateCalculation => "Rate calculation",
            Self::OrderCreation => "Order creation",
            Self::CourierAssignment => "Courier assignment",
            Self::PickupGeneration => "Pickup generation",
            Self::Tracking => "Tracking",
            Self::ShipmentCancellation => "Shipment cancellation",
            Self::ManifestGeneration => "Manifest generation",
            Self::LabelDownload => "Label download",
            Self::InvoiceDownload => "Invoice download",
            Self::ShipmentDetails => "Shipment details retrieval",
            Self::ReturnOrderCreation => "Return order creation",
            Self::PickupLocationCreation => "Pickup location creation",
            Self::PickupLocationUpdate => "Pickup location update",
            Self::PickupLocationDeletion => "Pickup location deletion",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors returned by [`super::Gateway`] and [`super::ShippingService`]
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("carrier authentication failed (HTTP {status}): {message}")]
    AuthFailure { status: u16, message: String },

    #[error("carrier request failed (HTTP {status}): {message}")]
    Carrier { status: u16, message: String },

    #[error("carrier transport error: {0}")]
    Transport(String),

    #[error("carrier request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid carrier request: {0}")]
    InvalidRequest(String),

    #[error("invalid carrier response: {0}")]
    InvalidResponse(String),

    #[error("{kind} failed: {message}")]
    Operation {
        kind: OperationKind,
        message: String,
        #[source]
        source: Box<GatewayError>,
    },
}

impl GatewayError {
    /// Attach operation context, keeping the carrier's message text.
    #[must_use]
    pub fn in_operation(self, kind: OperationKind) -> Self {
        let message = self.carrier_message();
        Self::Operation { kind, message, source: Box::new(self) }
    }

    /// The error with any operation context removed.
    pub fn root(&self) -> &Self {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn operation(&self) -> Option<OperationKind> {
        match self {
            Self::Operation { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            Self::Credential(_) => ErrorCategory::Credential,
            Self::AuthFailure { .. } => ErrorCategory::Authentication,
            Self::Carrier { .. } => ErrorCategory::Carrier,
            Self::Transport(_) | Self::Timeout(_) => ErrorCategory::Transport,
            Self::InvalidRequest(_) | Self::InvalidResponse(_) | Self::Operation { .. } => {
                ErrorCategory::Protocol
            }
        }
    }

    /// The carrier rejected the bearer token.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.root(), Self::AuthFailure { .. })
    }

    /// HTTP status reported by the carrier, if it answered at all.
    pub fn carrier_status(&self) -> Option<u16> {
        match self.root() {
            Self::AuthFailure { status, .. } | Self::Carrier { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable failure text, preferring the carrier's own message.
    pub fn carrier_message(&self) -> String {
        match self {
            Self::AuthFailure { message, .. }
            | Self::Carrier { message, .. }
            | Self::Operation { message, .. } => message.clone(),
            Self::Transport(message) | Self::InvalidRequest(message) | Self::InvalidResponse(message) => {
                message.clone()
            }
            Self::Credential(err) => err.to_string(),
            Self::Timeout(after) => format!("request timed out after {after:?}"),
        }
    }

    /// Status code to return to the gateway's own clients.
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::Credential | ErrorCategory::Authentication => 401,
            _ if self.operation() == Some(OperationKind::RateCalculation) => 400,
            _ => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self.status_code() {
            401 => "CARRIER_AUTH_ERROR",
            400 => "CARRIER_RATE_ERROR",
            _ => "CARRIER_SERVICE_ERROR",
        }
    }

    /// Message safe to show to the gateway's clients.
    pub fn client_message(&self) -> &'static str {
        match self.status_code() {
            401 => "Carrier authentication failed. Please check API credentials.",
            400 => "Unable to calculate shipping rates. Please check the provided addresses.",
            _ => "Shipping service temporarily unavailable. Please try again later.",
        }
    }
}

/// Whether a carrier error message reports a rejected credential.
pub fn mentions_auth_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    AUTH_FAILURE_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Extract the carrier's error text from a response body.
///
/// Prefers the JSON `message` field, then the raw body, then the status line.
pub fn carrier_message(status: StatusCode, body: &str) -> String {
    let message = match json_message(body) {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        _ => format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown status")
        ),
    };

    truncate(message)
}

/// The non-empty JSON `message` field of a carrier response body, if any.
pub fn json_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .filter(|message| !message.trim().is_empty())
        .map(str::to_owned)
}

fn truncate(mut message: String) -> String {
    if message.len() > MAX_MESSAGE_LEN {
        let mut cut = MAX_MESSAGE_LEN;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
        message.push('…');
    }
    message
}

//! Credential lifecycle errors

use shipgate_domain::ShipgateError;
use thiserror::Error;

/// Errors surfaced by [`super::CredentialManager`]
///
/// `Clone` because every caller joined to one refresh receives the same
/// result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// Every login attempt failed, or a non-retryable failure occurred
    #[error("carrier credential refresh failed after {attempts} attempt(s): {last_error}")]
    RefreshFailed {
        attempts: u32,
        #[source]
        last_error: ShipgateError,
    },

    /// The credential store could not be read
    #[error("credential store unavailable: {0}")]
    Store(#[source] ShipgateError),

    /// The refresh task ended without producing a result
    #[error("carrier credential refresh interrupted: {0}")]
    Interrupted(String),
}

impl CredentialError {
    /// Underlying infrastructure error, if any
    pub fn last_error(&self) -> Option<&ShipgateError> {
        match self {
            Self::RefreshFailed { last_error, .. } => Some(last_error),
            Self::Store(err) => Some(err),
            Self::Interrupted(_) => None,
        }
    }
}

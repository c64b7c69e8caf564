//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use shipgate_domain::ShipgateError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ShipgateError);

impl From<InfraError> for ShipgateError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ShipgateError> for InfraError {
    fn from(value: ShipgateError) -> Self {
        InfraError(value)
    }
}

trait IntoShipgateError {
    fn into_shipgate(self) -> ShipgateError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ShipgateError */
/* -------------------------------------------------------------------------- */

impl IntoShipgateError for HttpError {
    fn into_shipgate(self) -> ShipgateError {
        if self.is_timeout() {
            return ShipgateError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return ShipgateError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_error(status.as_u16(), status.canonical_reason());
        }

        if self.is_decode() {
            return ShipgateError::Internal(format!("invalid HTTP response body: {self}"));
        }

        ShipgateError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_shipgate())
    }
}

/// Map a non-success HTTP status onto the domain error taxonomy.
///
/// Rejected credentials become `Auth` so login retries stop; rate limits and
/// server errors stay `Network` so they are retried.
pub fn status_error(code: u16, reason: Option<&str>) -> ShipgateError {
    let message = format!("HTTP {} {}", code, reason.unwrap_or("unknown status"));

    match code {
        401 | 403 => ShipgateError::Auth(message),
        404 => ShipgateError::NotFound(message),
        429 => ShipgateError::Network(message),
        400..=499 => ShipgateError::InvalidInput(message),
        _ => ShipgateError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* redis::RedisError → ShipgateError */
/* -------------------------------------------------------------------------- */

#[cfg(feature = "redis")]
impl IntoShipgateError for redis::RedisError {
    fn into_shipgate(self) -> ShipgateError {
        if self.is_timeout() {
            return ShipgateError::Store("redis operation timed out".into());
        }
        if self.is_connection_refusal() || self.is_connection_dropped() {
            return ShipgateError::Store(format!("redis connection failure: {self}"));
        }
        ShipgateError::Store(self.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for InfraError {
    fn from(value: redis::RedisError) -> Self {
        InfraError(value.into_shipgate())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

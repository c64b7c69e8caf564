//! Authenticated carrier gateway
//!
//! Sends carrier requests with the shared bearer token. A response that
//! reports a rejected credential triggers one forced refresh and exactly one
//! retry; every other failure is returned immediately.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use shipgate_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use shipgate_domain::{CarrierConfig, CarrierHealth, ShipgateError};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::auth::AccessTokenProvider;
use super::endpoint;
use super::errors::{carrier_message, json_message, mentions_auth_failure, GatewayError};
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Configuration for [`Gateway`]
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Carrier API base URL (e.g. "https://apiv2.carrier.example/v1/external/")
    pub base_url: String,
    /// Timeout for each request attempt
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn from_config(config: &CarrierConfig) -> Self {
        Self { base_url: config.base_url.clone(), timeout: config.request_timeout() }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// One send of a carrier request.
#[derive(Debug, Clone, Copy)]
struct RequestAttempt<'a> {
    method: &'a Method,
    path: &'a str,
    payload: Option<&'a Value>,
    /// Whether this send follows a forced credential refresh
    after_refresh: bool,
}

impl<'a> RequestAttempt<'a> {
    const fn first(method: &'a Method, path: &'a str, payload: Option<&'a Value>) -> Self {
        Self { method, path, payload, after_refresh: false }
    }

    const fn retry(self) -> Self {
        Self { after_refresh: true, ..self }
    }
}

/// Carrier gateway
pub struct Gateway {
    http: HttpClient,
    tokens: Arc<dyn AccessTokenProvider>,
    base_url: Url,
    timeout: Duration,
}

impl Gateway {
    /// # Errors
    /// `GatewayError::InvalidRequest` if the base URL cannot be parsed.
    pub fn new(
        http: HttpClient,
        tokens: Arc<dyn AccessTokenProvider>,
        config: GatewayConfig,
    ) -> Result<Self, GatewayError> {
        let base_url = endpoint::base_url(&config.base_url)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        Ok(Self { http, tokens, base_url, timeout: config.timeout })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send an authenticated request and return the parsed response body.
    ///
    /// `GET` sends the payload's top-level fields as query parameters; other
    /// methods send it as a JSON body. An empty 2xx body yields `Value::Null`.
    ///
    /// # Errors
    /// - `Credential` if no token could be obtained
    /// - `AuthFailure` if the carrier rejects the token again after a refresh
    /// - `Carrier`, `Transport`, `Timeout` or `InvalidResponse` otherwise
    #[instrument(skip(self, payload))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Value, GatewayError> {
        let attempt = RequestAttempt::first(&method, path, payload);
        let token = self.tokens.access_token(false).await?;

        match self.send(attempt, &token).await {
            Err(err) if err.is_auth_failure() => {
                warn!(%method, path, error = %err, "carrier rejected credential, refreshing");
                let token = self.tokens.access_token(true).await?;
                self.send(attempt.retry(), &token).await
            }
            other => other,
        }
    }

    /// Carrier health derived from the stored credential; never fails.
    pub async fn health(&self) -> CarrierHealth {
        CarrierHealth::from_token_status(&self.tokens.token_status().await)
    }

    async fn send(&self, attempt: RequestAttempt<'_>, token: &str) -> Result<Value, GatewayError> {
        let url = endpoint::join(&self.base_url, attempt.path)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        let mut builder = self
            .http
            .request(attempt.method.clone(), url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json");

        if let Some(payload) = attempt.payload {
            builder = if attempt.method == Method::GET {
                builder.query(&query_pairs(payload)?)
            } else {
                builder.json(payload)
            };
        }

        debug!(after_refresh = attempt.after_refresh, "sending carrier request");

        let exchange = async {
            let response = self.http.send(builder).await?;
            let status = response.status();
            let body =
                response.text().await.map_err(|e| ShipgateError::from(InfraError::from(e)))?;
            Ok::<_, ShipgateError>((status, body))
        };

        let (status, body) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(exchange)) => exchange,
            Ok(Err(err)) => return Err(GatewayError::Transport(err.to_string())),
            Err(_) => return Err(GatewayError::Timeout(self.timeout)),
        };

        let result = classify(status, &body);
        match &result {
            Ok(_) => info!(status = status.as_u16(), "carrier request succeeded"),
            Err(err) => debug!(status = status.as_u16(), error = %err, "carrier request failed"),
        }
        result
    }
}

fn classify(status: StatusCode, body: &str) -> Result<Value, GatewayError> {
    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(body)
            .map_err(|e| GatewayError::InvalidResponse(format!("body is not JSON: {e}")));
    }

    let code = status.as_u16();
    // Auth phrases count only in the carrier's JSON `message`, never in a raw body.
    let auth_rejected = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || json_message(body).is_some_and(|message| mentions_auth_failure(&message));
    let message = carrier_message(status, body);

    if auth_rejected {
        Err(GatewayError::AuthFailure { status: code, message })
    } else {
        Err(GatewayError::Carrier { status: code, message })
    }
}

/// Flatten a JSON object into query pairs. Nested values are sent as JSON text.
fn query_pairs(payload: &Value) -> Result<Vec<(String, String)>, GatewayError> {
    let Value::Object(fields) = payload else {
        return Err(GatewayError::InvalidRequest("GET payload must be a JSON object".into()));
    };

    Ok(fields
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect())
}

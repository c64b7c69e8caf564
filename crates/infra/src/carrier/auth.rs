//! Carrier authentication
//!
//! [`HttpCarrierAuthenticator`] performs a single login against the carrier;
//! [`AccessTokenProvider`] is how the gateway obtains bearer tokens.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use shipgate_core::{CarrierAuthenticator, CredentialError, CredentialManager};
use shipgate_domain::constants::LOGIN_PATH;
use shipgate_domain::{CarrierConfig, Result, ShipgateError, TokenStatus};
use tracing::{debug, instrument, warn};
use url::Url;

use super::errors::carrier_message;
use super::endpoint;
use crate::errors::conversions::status_error;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Trait for providing carrier bearer tokens
///
/// This trait allows dependency injection and testing with fake providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a usable token; `force_refresh` discards the cached one.
    async fn access_token(&self, force_refresh: bool) -> std::result::Result<String, CredentialError>;

    /// Current token status, without refreshing.
    async fn token_status(&self) -> TokenStatus;
}

#[async_trait]
impl AccessTokenProvider for CredentialManager {
    async fn access_token(&self, force_refresh: bool) -> std::result::Result<String, CredentialError> {
        self.get_token(force_refresh).await
    }

    async fn token_status(&self) -> TokenStatus {
        self.status().await
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

/// Logs in to the carrier with email and password.
pub struct HttpCarrierAuthenticator {
    http: HttpClient,
    login_url: Url,
    email: String,
    password: String,
}

impl HttpCarrierAuthenticator {
    /// # Errors
    /// `ShipgateError::Config` if the carrier base URL is invalid.
    pub fn new(http: HttpClient, config: &CarrierConfig) -> Result<Self> {
        let base = endpoint::base_url(&config.base_url)?;
        let login_url = endpoint::join(&base, LOGIN_PATH)?;

        Ok(Self {
            http,
            login_url,
            email: config.email.clone(),
            password: config.password.clone(),
        })
    }
}

impl fmt::Debug for HttpCarrierAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpCarrierAuthenticator")
            .field("login_url", &self.login_url.as_str())
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CarrierAuthenticator for HttpCarrierAuthenticator {
    #[instrument(skip(self), fields(url = %self.login_url))]
    async fn login(&self) -> Result<String> {
        let request = LoginRequest { email: &self.email, password: &self.password };
        let builder = self.http.request(Method::POST, self.login_url.clone()).json(&request);

        let response = self.http.send(builder).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = carrier_message(status, &body);
            warn!(status = status.as_u16(), %message, "carrier login rejected");
            return Err(login_failure(status, message));
        }

        let body: LoginResponse =
            response.json().await.map_err(|err| ShipgateError::from(InfraError::from(err)))?;

        match body.token {
            Some(token) if !token.is_empty() => {
                debug!("carrier login succeeded");
                Ok(token)
            }
            _ => Err(ShipgateError::Internal("carrier login response did not include a token".into())),
        }
    }
}

/// Client errors mean the credentials were refused and will be refused again.
fn login_failure(status: StatusCode, message: String) -> ShipgateError {
    let code = status.as_u16();
    if status.is_client_error() && code != 408 && code != 429 {
        return ShipgateError::Auth(format!("carrier rejected login (HTTP {code}): {message}"));
    }
    match status_error(code, status.canonical_reason()) {
        ShipgateError::Network(line) => ShipgateError::Network(format!("{line}: {message}")),
        other => other,
    }
}

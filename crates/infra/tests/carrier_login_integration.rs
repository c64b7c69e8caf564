//! End-to-end credential lifecycle against a mocked carrier login
//!
//! **Infrastructure:**
//! - WireMock carrier (`auth/login` plus one business endpoint)
//! - Real `CredentialManager` over the moka in-process store
//! - `HttpCarrierAuthenticator` and `Gateway` wired as in production

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::json;
use shipgate_common::{BackoffStrategy, RetryConfig, SystemClock};
use shipgate_core::{CredentialError, CredentialManager, CredentialSettings, CredentialStore};
use shipgate_domain::{CarrierConfig, CredentialKeys, HealthState, ShipgateError};
use shipgate_infra::carrier::{Gateway, GatewayConfig, HttpCarrierAuthenticator};
use shipgate_infra::{HttpClient, InMemoryCredentialStore};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PREFIX: &str = "it:carrier:";

fn carrier_config(server: &MockServer) -> CarrierConfig {
    CarrierConfig {
        base_url: format!("{}/v1/external", server.uri()),
        email: "ops@example.com".into(),
        password: "secret".into(),
        request_timeout_secs: 5,
        login_timeout_secs: 5,
    }
}

fn settings() -> CredentialSettings {
    CredentialSettings {
        retry: RetryConfig::new(
            3,
            BackoffStrategy::doubling(Duration::from_millis(10), Duration::from_millis(100)),
        ),
        keys: CredentialKeys::from_prefix(PREFIX),
        ..CredentialSettings::default()
    }
}

fn manager(server: &MockServer, store: Arc<InMemoryCredentialStore>) -> CredentialManager {
    let http = HttpClient::new().expect("http client");
    let authenticator =
        HttpCarrierAuthenticator::new(http, &carrier_config(server)).expect("authenticator");
    CredentialManager::new(store, Arc::new(authenticator), Arc::new(SystemClock), settings())
}

#[tokio::test]
async fn login_token_is_stored_and_reused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/external/auth/login"))
        .and(body_json(json!({ "email": "ops@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "jwt-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryCredentialStore::new());
    let manager = manager(&server, store.clone());

    assert_eq!(manager.get_token(false).await.unwrap(), "jwt-1");
    assert_eq!(manager.get_token(false).await.unwrap(), "jwt-1");

    assert_eq!(store.get("it:carrier:token").await.unwrap().as_deref(), Some("jwt-1"));
    let expiry: i64 = store.get("it:carrier:token:expiry").await.unwrap().unwrap().parse().unwrap();
    let expected = chrono::Utc::now().timestamp() + 864_000;
    assert!((expiry - expected).abs() <= 2);

    let status = manager.status().await;
    assert!(status.valid);
    assert!(!status.needs_refresh);
}

#[tokio::test]
async fn rejected_credentials_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/external/auth/login"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid email and password combination" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager(&server, Arc::new(InMemoryCredentialStore::new()));
    let err = manager.get_token(false).await.unwrap_err();

    match err {
        CredentialError::RefreshFailed { attempts, last_error: ShipgateError::Auth(message) } => {
            assert_eq!(attempts, 1);
            assert!(message.contains("Invalid email"));
        }
        other => panic!("expected auth refresh failure, got {other:?}"),
    }
}

#[tokio::test]
async fn carrier_outage_is_retried_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/external/auth/login"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let manager = manager(&server, Arc::new(InMemoryCredentialStore::new()));
    let err = manager.get_token(false).await.unwrap_err();

    assert!(matches!(
        err,
        CredentialError::RefreshFailed { attempts: 3, last_error: ShipgateError::Network(_) }
    ));
}

#[tokio::test]
async fn missing_token_field_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/external/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "company_id": 1 })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/external/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "jwt-2" })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager(&server, Arc::new(InMemoryCredentialStore::new()));
    assert_eq!(manager.get_token(false).await.unwrap(), "jwt-2");
}

#[tokio::test]
async fn gateway_refreshes_rejected_token_through_manager() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/external/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/external/courier/track"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Token has expired" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/external/courier/track"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tracking_data": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryCredentialStore::new());
    let expiry = (chrono::Utc::now().timestamp() + 86_400).to_string();
    store.set_with_ttl("it:carrier:token", "stale", Duration::from_secs(60)).await.unwrap();
    store.set_with_ttl("it:carrier:token:expiry", &expiry, Duration::from_secs(60)).await.unwrap();

    let manager = manager(&server, store.clone());
    let gateway = Gateway::new(
        HttpClient::new().unwrap(),
        Arc::new(manager.clone()),
        GatewayConfig::from_config(&carrier_config(&server)),
    )
    .unwrap();

    let body = gateway
        .request(Method::GET, "courier/track", Some(&json!({ "order_id": "1" })))
        .await
        .expect("retried with fresh token");

    assert!(body["tracking_data"].is_object());
    assert_eq!(store.get("it:carrier:token").await.unwrap().as_deref(), Some("fresh"));
    assert_eq!(gateway.health().await.status, HealthState::Healthy);
}

//! Test wiring for the application context

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use shipgate_api::AppContext;
use shipgate_common::SystemClock;
use shipgate_core::{CarrierAuthenticator, CredentialStore};
use shipgate_domain::{
    CarrierConfig, Config, CredentialConfig, Result, ServerConfig, ShipgateError, StoreConfig,
};
use shipgate_infra::{HttpClient, InMemoryCredentialStore, TracingShipmentRecorder};

/// Login that succeeds with `token-<n>` or always fails with `Auth`.
pub struct FakeLogin {
    calls: AtomicU32,
    reject: bool,
}

impl FakeLogin {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self { calls: AtomicU32::new(0), reject: false })
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self { calls: AtomicU32::new(0), reject: true })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CarrierAuthenticator for FakeLogin {
    async fn login(&self) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.reject {
            return Err(ShipgateError::Auth("invalid email and password".into()));
        }
        Ok(format!("token-{n}"))
    }
}

pub fn test_config() -> Config {
    Config {
        carrier: CarrierConfig {
            base_url: "http://127.0.0.1:9/v1/external/".into(),
            email: "ops@example.com".into(),
            password: "secret".into(),
            request_timeout_secs: 5,
            login_timeout_secs: 5,
        },
        credentials: CredentialConfig { login_backoff_ms: 10, ..CredentialConfig::default() },
        store: StoreConfig::default(),
        server: ServerConfig::default(),
    }
}

pub fn context(login: Arc<FakeLogin>) -> (AppContext, Arc<InMemoryCredentialStore>) {
    let store = Arc::new(InMemoryCredentialStore::new());
    let context = AppContext::from_parts(
        test_config(),
        HttpClient::new().expect("http client"),
        store.clone(),
        login,
        Arc::new(SystemClock),
        Arc::new(TracingShipmentRecorder),
    )
    .expect("context");
    (context, store)
}

pub async fn stored_token(store: &InMemoryCredentialStore) -> Option<String> {
    store.get("shipgate:carrier:token").await.expect("store readable")
}

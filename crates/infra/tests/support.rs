//! Shared fakes for the carrier integration tests

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use shipgate_core::{CredentialError, ShipmentRecorder};
use shipgate_domain::{Result, ShipgateError, ShipmentUpdate, TokenStatus};
use shipgate_infra::carrier::{AccessTokenProvider, Gateway, GatewayConfig, ShippingService};
use shipgate_infra::HttpClient;

/// Token provider that hands out `token-0` until forced, then `token-1`, ...
pub struct FakeTokens {
    generation: AtomicU32,
    forced: AtomicU32,
    fail_with: Mutex<Option<CredentialError>>,
    status: Mutex<TokenStatus>,
}

impl FakeTokens {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            generation: AtomicU32::new(0),
            forced: AtomicU32::new(0),
            fail_with: Mutex::new(None),
            status: Mutex::new(TokenStatus::missing()),
        })
    }

    pub fn current(&self) -> String {
        format!("token-{}", self.generation.load(Ordering::SeqCst))
    }

    pub fn forced_refreshes(&self) -> u32 {
        self.forced.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, err: CredentialError) {
        *self.fail_with.lock() = Some(err);
    }

    pub fn set_status(&self, status: TokenStatus) {
        *self.status.lock() = status;
    }
}

#[async_trait]
impl AccessTokenProvider for FakeTokens {
    async fn access_token(&self, force_refresh: bool) -> std::result::Result<String, CredentialError> {
        if let Some(err) = self.fail_with.lock().clone() {
            return Err(err);
        }
        if force_refresh {
            self.forced.fetch_add(1, Ordering::SeqCst);
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        Ok(self.current())
    }

    async fn token_status(&self) -> TokenStatus {
        self.status.lock().clone()
    }
}

/// Captures every shipment update.
#[derive(Default)]
pub struct RecordingRecorder {
    updates: Mutex<Vec<(String, ShipmentUpdate)>>,
    failing: AtomicBool,
}

impl RecordingRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn updates(&self) -> Vec<(String, ShipmentUpdate)> {
        self.updates.lock().clone()
    }

    pub fn last(&self) -> Option<(String, ShipmentUpdate)> {
        self.updates.lock().last().cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ShipmentRecorder for RecordingRecorder {
    async fn record(&self, order_id: &str, update: &ShipmentUpdate) -> Result<()> {
        self.updates.lock().push((order_id.to_string(), update.clone()));
        if self.failing.load(Ordering::SeqCst) {
            return Err(ShipgateError::Internal("order store offline".into()));
        }
        Ok(())
    }
}

pub fn gateway(base_url: &str, tokens: Arc<FakeTokens>) -> Gateway {
    gateway_with_timeout(base_url, tokens, Duration::from_secs(5))
}

pub fn gateway_with_timeout(base_url: &str, tokens: Arc<FakeTokens>, timeout: Duration) -> Gateway {
    let config = GatewayConfig { base_url: format!("{base_url}/v1/external/"), timeout };
    Gateway::new(HttpClient::new().expect("http client"), tokens, config).expect("gateway")
}

pub fn service(base_url: &str) -> (ShippingService, Arc<FakeTokens>, Arc<RecordingRecorder>) {
    let tokens = FakeTokens::new();
    let recorder = RecordingRecorder::new();
    let service = ShippingService::new(Arc::new(gateway(base_url, tokens.clone())), recorder.clone());
    (service, tokens, recorder)
}

//! Application context - dependency injection container

use std::sync::Arc;

use shipgate_common::{Clock, SystemClock};
use shipgate_core::{
    CarrierAuthenticator, CredentialError, CredentialManager, CredentialRefresher,
    CredentialSettings, CredentialStore, RefresherConfig, ShipmentRecorder,
};
use shipgate_domain::{Config, Result, ShipgateError, StoreConfig};
use shipgate_infra::carrier::{
    Gateway, GatewayConfig, HttpCarrierAuthenticator, ShippingService, TracingShipmentRecorder,
};
use shipgate_infra::{HttpClient, InMemoryCredentialStore};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Background tasks owned by the context
struct Lifecycle {
    refresher: CredentialRefresher,
    event_logger: Option<JoinHandle<()>>,
}

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn CredentialStore>,
    pub credentials: CredentialManager,
    pub gateway: Arc<Gateway>,
    pub shipping: Arc<ShippingService>,
    lifecycle: Mutex<Lifecycle>,
}

impl AppContext {
    /// Wire the production stack from configuration.
    ///
    /// # Errors
    /// `ShipgateError::Config` for unusable settings, `ShipgateError::Store`
    /// if the shared store cannot be reached.
    pub async fn new(config: Config) -> Result<Self> {
        let store = build_store(&config.store).await?;
        let http = HttpClient::builder().timeout(config.carrier.transport_timeout()).build()?;
        let authenticator = Arc::new(HttpCarrierAuthenticator::new(http.clone(), &config.carrier)?);

        Self::from_parts(
            config,
            http,
            store,
            authenticator,
            Arc::new(SystemClock),
            Arc::new(TracingShipmentRecorder),
        )
    }

    /// Wire the context around caller-supplied ports.
    ///
    /// # Errors
    /// `ShipgateError::Config` if the carrier base URL is invalid.
    pub fn from_parts(
        config: Config,
        http: HttpClient,
        store: Arc<dyn CredentialStore>,
        authenticator: Arc<dyn CarrierAuthenticator>,
        clock: Arc<dyn Clock>,
        recorder: Arc<dyn ShipmentRecorder>,
    ) -> Result<Self> {
        let credentials = CredentialManager::new(
            store.clone(),
            authenticator,
            clock,
            CredentialSettings::from_config(&config),
        );

        let gateway = Gateway::new(
            http,
            Arc::new(credentials.clone()),
            GatewayConfig::from_config(&config.carrier),
        )
        .map_err(|e| ShipgateError::Config(e.to_string()))?;
        let gateway = Arc::new(gateway);
        let shipping = Arc::new(ShippingService::new(gateway.clone(), recorder));

        let refresher = CredentialRefresher::new(
            credentials.clone(),
            RefresherConfig::from_config(&config.credentials),
        );

        Ok(Self {
            config,
            store,
            credentials,
            gateway,
            shipping,
            lifecycle: Mutex::new(Lifecycle { refresher, event_logger: None }),
        })
    }

    /// Obtain the first credential and start background refreshing.
    ///
    /// # Errors
    /// The refresh failure if no credential could be obtained; the service
    /// must not start without one.
    pub async fn warm_up(&self) -> std::result::Result<(), CredentialError> {
        let mut lifecycle = self.lifecycle.lock().await;

        if lifecycle.event_logger.is_none() {
            lifecycle.event_logger = Some(self.spawn_refresh_logger());
        }

        self.credentials.get_token(false).await?;
        info!("carrier credential ready");

        if let Err(err) = lifecycle.refresher.start() {
            warn!(error = %err, "credential refresher not started");
        }
        Ok(())
    }

    /// Whether the background refresher is running.
    pub async fn is_refreshing_in_background(&self) -> bool {
        self.lifecycle.lock().await.refresher.is_running()
    }

    /// Stop background work and release the store connection.
    pub async fn shutdown(&self) {
        let mut lifecycle = self.lifecycle.lock().await;

        if lifecycle.refresher.is_running() {
            if let Err(err) = lifecycle.refresher.stop().await {
                warn!(error = %err, "credential refresher did not stop cleanly");
            }
        }

        if let Some(handle) = lifecycle.event_logger.take() {
            handle.abort();
        }

        match self.store.close().await {
            Ok(()) => info!("credential store closed"),
            Err(err) => error!(error = %err, "failed to close credential store"),
        }
    }

    fn spawn_refresh_logger(&self) -> JoinHandle<()> {
        let mut events = self.credentials.subscribe();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => info!(
                        issued_at = %event.issued_at,
                        expires_at = %event.expires_at,
                        attempts = event.attempts,
                        "carrier credential refreshed"
                    ),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "refresh event logger lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

async fn build_store(config: &StoreConfig) -> Result<Arc<dyn CredentialStore>> {
    match config.url.as_deref() {
        None => {
            info!("using in-process credential store");
            Ok(Arc::new(InMemoryCredentialStore::new()))
        }
        #[cfg(feature = "redis")]
        Some(url) => {
            let store = tokio::time::timeout(
                config.timeout(),
                shipgate_infra::RedisCredentialStore::connect(url),
            )
            .await
            .map_err(|_| ShipgateError::Store("timed out connecting to redis".into()))??;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => Err(ShipgateError::Config(
            "a store URL is configured but this build lacks the `redis` feature".into(),
        )),
    }
}

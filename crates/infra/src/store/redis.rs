//! Redis credential store shared by every gateway instance

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use shipgate_core::CredentialStore;
use shipgate_domain::{Result, ShipgateError};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::InfraError;

/// `GET`/`SETEX` over one multiplexed async connection.
pub struct RedisCredentialStore {
    connection: RwLock<Option<MultiplexedConnection>>,
}

impl RedisCredentialStore {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379/0`).
    ///
    /// # Errors
    /// `ShipgateError::Config` for an invalid URL, `ShipgateError::Store`
    /// if the server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| ShipgateError::Config(format!("invalid redis URL: {e}")))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ShipgateError::from(InfraError::from(e)))?;

        info!("connected to redis credential store");
        Ok(Self { connection: RwLock::new(Some(connection)) })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or_else(|| ShipgateError::Store("credential store is closed".into()))
    }
}

#[async_trait]
impl CredentialStore for RedisCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut connection = self.connection().await?;
        let value: Option<String> =
            connection.get(key).await.map_err(|e| ShipgateError::from(InfraError::from(e)))?;
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let seconds = ttl.as_secs().max(1);
        let mut connection = self.connection().await?;
        connection
            .set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|e| ShipgateError::from(InfraError::from(e)))?;
        debug!(key, ttl_secs = seconds, "stored credential key");
        Ok(())
    }

    /// Drops this store's connection handle; the connection closes once
    /// in-flight operations holding clones finish.
    async fn close(&self) -> Result<()> {
        if self.connection.write().await.take().is_some() {
            info!("redis credential store closed");
        }
        Ok(())
    }
}

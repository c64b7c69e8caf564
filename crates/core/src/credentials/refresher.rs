//! Periodic credential refresher
//!
//! Wakes on a fixed interval and refreshes the stored credential when it is
//! inside the refresh buffer. Shares the manager's single-flight state with
//! inline background refreshes.

use std::time::Duration;

use shipgate_domain::constants::DEFAULT_REFRESH_CHECK_INTERVAL_SECS;
use shipgate_domain::CredentialConfig;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::manager::{CredentialManager, RefreshCheck};

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle errors for [`CredentialRefresher`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefresherError {
    #[error("credential refresher already running")]
    AlreadyRunning,

    #[error("credential refresher not running")]
    NotRunning,

    #[error("credential refresher task panicked: {0}")]
    TaskPanicked(String),

    #[error("credential refresher did not stop within {0:?}")]
    StopTimeout(Duration),
}

/// Configuration for the refresher
#[derive(Debug, Clone)]
pub struct RefresherConfig {
    /// Time between expiry checks
    pub interval: Duration,
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(DEFAULT_REFRESH_CHECK_INTERVAL_SECS) }
    }
}

impl RefresherConfig {
    pub fn from_config(config: &CredentialConfig) -> Self {
        Self { interval: config.check_interval() }
    }
}

/// Background task that keeps the credential ahead of expiry
pub struct CredentialRefresher {
    manager: CredentialManager,
    config: RefresherConfig,
    cancellation_token: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl CredentialRefresher {
    pub fn new(manager: CredentialManager, config: RefresherConfig) -> Self {
        Self {
            manager,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Spawn the periodic check loop.
    ///
    /// # Errors
    /// `AlreadyRunning` if started twice without a stop in between.
    #[instrument(skip(self), fields(interval_secs = self.config.interval.as_secs()))]
    pub fn start(&mut self) -> Result<(), RefresherError> {
        if self.is_running() {
            return Err(RefresherError::AlreadyRunning);
        }

        // Fresh token so the refresher can be restarted after a stop.
        self.cancellation_token = CancellationToken::new();

        let manager = self.manager.clone();
        let interval = self.config.interval;
        let cancel = self.cancellation_token.clone();
        self.task_handle = Some(tokio::spawn(Self::check_loop(manager, interval, cancel)));

        info!("credential refresher started");
        Ok(())
    }

    /// Cancel the loop and wait for it to finish.
    ///
    /// # Errors
    /// `NotRunning`, or the task panicked or overran the stop timeout.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), RefresherError> {
        let Some(handle) = self.task_handle.take() else {
            return Err(RefresherError::NotRunning);
        };

        self.cancellation_token.cancel();

        match tokio::time::timeout(STOP_TIMEOUT, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(error = %err, "credential refresher task panicked");
                return Err(RefresherError::TaskPanicked(err.to_string()));
            }
            Err(_) => {
                warn!("credential refresher did not stop in time");
                return Err(RefresherError::StopTimeout(STOP_TIMEOUT));
            }
        }

        info!("credential refresher stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    async fn check_loop(manager: CredentialManager, interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("credential check loop cancelled");
                    break;
                }
                () = tokio::time::sleep(interval) => {}
            }

            // An in-flight refresh keeps running in its own task if this is
            // cancelled.
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("credential check loop cancelled mid-check");
                    break;
                }
                outcome = manager.refresh_if_expiring() => match outcome {
                    Ok(RefreshCheck::Refreshed) => info!("credential refreshed ahead of expiry"),
                    Ok(check) => debug!(?check, "credential check complete"),
                    Err(err) => warn!(error = %err, "background credential check failed"),
                },
            }
        }
    }
}

impl Drop for CredentialRefresher {
    fn drop(&mut self) {
        if self.task_handle.is_some() && !self.cancellation_token.is_cancelled() {
            warn!("CredentialRefresher dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}

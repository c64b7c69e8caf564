//! Shipgate - carrier integration gateway
//!
//! Loads configuration, obtains the first carrier credential, serves the
//! health endpoint and shuts down cleanly on SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use shipgate_api::routes;
use shipgate_api::utils::logging::{self, LogFormat};
use shipgate_api::AppContext;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    logging::init(LogFormat::from_env()).context("failed to initialise logging")?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => debug!(error = %err, "no .env file loaded"),
    }

    info!(version = env!("CARGO_PKG_VERSION"), "shipgate starting");

    let config = shipgate_infra::config::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    let context =
        Arc::new(AppContext::new(config).await.context("failed to build application context")?);

    if let Err(err) = context.warm_up().await {
        error!(error = %err, "could not obtain carrier credential at startup");
        context.shutdown().await;
        return Err(err).context("startup aborted");
    }

    let bind_addr = context.config.server.bind_addr.clone();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "health endpoint listening");

    let served = axum::serve(listener, routes::router(context.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    context.shutdown().await;
    info!("shipgate stopped");

    served.context("server error")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}

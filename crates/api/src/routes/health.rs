//! Carrier health route

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::AppContext;

pub const CARRIER_HEALTH_PATH: &str = "/health/carrier";

pub fn router() -> Router<Arc<AppContext>> {
    Router::new().route(CARRIER_HEALTH_PATH, get(carrier_health))
}

/// 200 with the credential report when a valid token is stored, 503 otherwise.
async fn carrier_health(State(context): State<Arc<AppContext>>) -> impl IntoResponse {
    let health = context.gateway.health().await;
    let status =
        StatusCode::from_u16(health.http_status()).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
    (status, Json(health))
}

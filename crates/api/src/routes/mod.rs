//! HTTP routes served by the gateway process

pub mod health;

use std::sync::Arc;

use axum::Router;

use crate::AppContext;

/// Build the application router.
pub fn router(context: Arc<AppContext>) -> Router {
    Router::new().merge(health::router()).with_state(context)
}

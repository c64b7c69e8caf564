//! Port for persisting carrier identifiers onto the caller's order

use async_trait::async_trait;
use shipgate_domain::{Result, ShipmentUpdate};

/// Side-effect hook invoked after a successful carrier operation
#[async_trait]
pub trait ShipmentRecorder: Send + Sync {
    /// Merge the populated fields of `update` into the order `order_id`
    async fn record(&self, order_id: &str, update: &ShipmentUpdate) -> Result<()>;
}

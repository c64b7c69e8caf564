use async_trait::async_trait;
use shipgate_core::ShipmentRecorder;
use shipgate_domain::{Result, ShipmentUpdate};
use tracing::info;

/// Logs shipment updates for deployments without an order store.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingShipmentRecorder;

#[async_trait]
impl ShipmentRecorder for TracingShipmentRecorder {
    async fn record(&self, order_id: &str, update: &ShipmentUpdate) -> Result<()> {
        let fields = serde_json::to_string(update).unwrap_or_default();
        info!(order_id, update = %fields, "carrier shipment update");
        Ok(())
    }
}

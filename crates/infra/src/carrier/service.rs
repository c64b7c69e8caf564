//! Typed carrier operations
//!
//! Each operation maps its input onto the carrier payload, sends it through
//! the [`Gateway`], labels failures with the operation, and records the
//! identifiers the carrier returned against the caller's order.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use shipgate_core::ShipmentRecorder;
use shipgate_domain::{
    CourierAssignment, OrderRequest, PickupLocation, RateQuery, ReturnOrderRequest, ShipmentUpdate,
};
use tracing::{info, instrument, warn};

use super::errors::{GatewayError, OperationKind};
use super::gateway::Gateway;
use super::payloads;

/// Order created at the carrier
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedOrder {
    pub carrier_order_id: Option<String>,
    pub shipment_id: Option<String>,
    pub response: Value,
}

/// Courier and AWB assigned to a shipment
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedCourier {
    pub awb_code: Option<String>,
    pub courier_name: Option<String>,
    pub response: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tracking {
    pub tracking_url: Option<String>,
    pub tracking_data: Value,
    pub shipment_status: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub manifest_url: Option<String>,
    pub manifest_id: Option<String>,
    pub response: Value,
}

/// Printable document (label or invoice)
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub url: Option<String>,
    pub response: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnOrder {
    pub return_order_id: Option<String>,
    pub return_shipment_id: Option<String>,
    pub response: Value,
}

/// Carrier operations with order side effects
pub struct ShippingService {
    gateway: Arc<Gateway>,
    recorder: Arc<dyn ShipmentRecorder>,
}

impl ShippingService {
    pub fn new(gateway: Arc<Gateway>, recorder: Arc<dyn ShipmentRecorder>) -> Self {
        Self { gateway, recorder }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// Courier serviceability and rates between two postcodes.
    #[instrument(skip_all)]
    pub async fn calculate_rate(&self, query: &RateQuery) -> Result<Value, GatewayError> {
        self.call(
            OperationKind::RateCalculation,
            Method::GET,
            "courier/serviceability/",
            Some(&payloads::rate_query(query)),
        )
        .await
    }

    #[instrument(skip_all, fields(order_id = %request.order_id))]
    pub async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder, GatewayError> {
        let response = self
            .call(
                OperationKind::OrderCreation,
                Method::POST,
                "orders/create/adhoc",
                Some(&payloads::order(request)),
            )
            .await?;

        let created = CreatedOrder {
            carrier_order_id: text_at(&response, "/order_id"),
            shipment_id: text_at(&response, "/shipment_id"),
            response,
        };

        self.record(
            &request.order_id,
            ShipmentUpdate {
                carrier_order_id: created.carrier_order_id.clone(),
                shipment_id: created.shipment_id.clone(),
                pickup_location_id: request.pickup_location_id.clone(),
                ..ShipmentUpdate::default()
            },
        )
        .await;

        Ok(created)
    }

    #[instrument(skip_all, fields(order_id = %assignment.order_id))]
    pub async fn assign_courier(
        &self,
        assignment: &CourierAssignment,
    ) -> Result<AssignedCourier, GatewayError> {
        let response = self
            .call(
                OperationKind::CourierAssignment,
                Method::POST,
                "courier/assign/awb",
                Some(&payloads::courier_assignment(assignment)),
            )
            .await?;

        let assigned = AssignedCourier {
            awb_code: text_at(&response, "/response/data/awb_code"),
            courier_name: text_at(&response, "/response/data/courier_name"),
            response,
        };

        let courier_company_id = text_at(&assigned.response, "/response/data/courier_company_id")
            .or_else(|| assignment.courier_id.clone());

        self.record(
            &assignment.order_id,
            ShipmentUpdate {
                awb_code: assigned.awb_code.clone(),
                courier_company_id,
                courier_name: assigned.courier_name.clone(),
                shipping_cost: assignment.shipping_cost,
                estimated_delivery_days: assignment.estimated_delivery_days.clone(),
                ..ShipmentUpdate::default()
            },
        )
        .await;

        Ok(assigned)
    }

    #[instrument(skip(self))]
    pub async fn generate_pickup(&self, shipment_id: &str) -> Result<Value, GatewayError> {
        self.call(
            OperationKind::PickupGeneration,
            Method::POST,
            "courier/generate/pickup",
            Some(&payloads::shipment_ids(&[shipment_id.to_string()])),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn track_shipment(
        &self,
        order_id: &str,
        carrier_order_id: &str,
    ) -> Result<Tracking, GatewayError> {
        let mut response = self
            .call(
                OperationKind::Tracking,
                Method::GET,
                "courier/track",
                Some(&payloads::tracking(carrier_order_id)),
            )
            .await?;

        let tracking = Tracking {
            tracking_url: text_at(&response, "/tracking_data/track_url"),
            shipment_status: response.get_mut("shipment_status").map(Value::take),
            tracking_data: response.get_mut("tracking_data").map(Value::take).unwrap_or_default(),
        };

        self.record(
            order_id,
            ShipmentUpdate { tracking_url: tracking.tracking_url.clone(), ..ShipmentUpdate::default() },
        )
        .await;

        Ok(tracking)
    }

    #[instrument(skip(self))]
    pub async fn cancel_shipment(
        &self,
        order_id: &str,
        carrier_order_ids: &[String],
    ) -> Result<Value, GatewayError> {
        let response = self
            .call(
                OperationKind::ShipmentCancellation,
                Method::POST,
                "orders/cancel",
                Some(&payloads::ids(carrier_order_ids)),
            )
            .await?;

        self.record(
            order_id,
            ShipmentUpdate {
                delivery_status: Some("cancelled".to_string()),
                ..ShipmentUpdate::default()
            },
        )
        .await;

        Ok(response)
    }

    #[instrument(skip(self))]
    pub async fn generate_manifest(
        &self,
        order_id: &str,
        shipment_ids: &[String],
    ) -> Result<Manifest, GatewayError> {
        let response = self
            .call(
                OperationKind::ManifestGeneration,
                Method::POST,
                "manifests/generate",
                Some(&payloads::shipment_ids(shipment_ids)),
            )
            .await?;

        let manifest = Manifest {
            manifest_url: text_at(&response, "/manifest_url"),
            manifest_id: text_at(&response, "/manifest_id"),
            response,
        };

        self.record(
            order_id,
            ShipmentUpdate { manifest_url: manifest.manifest_url.clone(), ..ShipmentUpdate::default() },
        )
        .await;

        Ok(manifest)
    }

    #[instrument(skip(self))]
    pub async fn download_label(
        &self,
        order_id: &str,
        shipment_ids: &[String],
    ) -> Result<Document, GatewayError> {
        let document =
            self.print(OperationKind::LabelDownload, "orders/print/label", "/label_url", shipment_ids).await?;

        self.record(
            order_id,
            ShipmentUpdate { label_url: document.url.clone(), ..ShipmentUpdate::default() },
        )
        .await;

        Ok(document)
    }

    #[instrument(skip(self))]
    pub async fn download_invoice(
        &self,
        order_id: &str,
        carrier_order_ids: &[String],
    ) -> Result<Document, GatewayError> {
        let document = self
            .print(OperationKind::InvoiceDownload, "orders/print/invoice", "/invoice_url", carrier_order_ids)
            .await?;

        self.record(
            order_id,
            ShipmentUpdate { invoice_url: document.url.clone(), ..ShipmentUpdate::default() },
        )
        .await;

        Ok(document)
    }

    #[instrument(skip(self))]
    pub async fn shipment_details(&self, shipment_id: &str) -> Result<Value, GatewayError> {
        let path = format!("shipments/show/{}", shipment_id.trim());
        self.call(OperationKind::ShipmentDetails, Method::GET, &path, None).await
    }

    /// Create a return at the carrier. `order_date` defaults to now.
    #[instrument(skip(self, request), fields(return_id = %request.return_id))]
    pub async fn create_return_order(
        &self,
        order_id: &str,
        request: &ReturnOrderRequest,
        reason: &str,
    ) -> Result<ReturnOrder, GatewayError> {
        let order_date = request
            .order_date
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

        let response = self
            .call(
                OperationKind::ReturnOrderCreation,
                Method::POST,
                "orders/create/return",
                Some(&payloads::return_order(request, &order_date)),
            )
            .await?;

        let created = ReturnOrder {
            return_order_id: text_at(&response, "/order_id"),
            return_shipment_id: text_at(&response, "/shipment_id"),
            response,
        };

        self.record(
            order_id,
            ShipmentUpdate {
                return_order_id: created.return_order_id.clone(),
                return_shipment_id: created.return_shipment_id.clone(),
                return_reason: Some(reason.to_string()),
                ..ShipmentUpdate::default()
            },
        )
        .await;

        Ok(created)
    }

    #[instrument(skip_all, fields(location = %location.location_name))]
    pub async fn add_pickup_location(&self, location: &PickupLocation) -> Result<Value, GatewayError> {
        self.call(
            OperationKind::PickupLocationCreation,
            Method::POST,
            "settings/company/addpickup",
            Some(&payloads::pickup_location(location)),
        )
        .await
    }

    /// Replace the details of the pickup location named `location_name`.
    #[instrument(skip(self, location))]
    pub async fn update_pickup_location(
        &self,
        location_name: &str,
        location: &PickupLocation,
    ) -> Result<Value, GatewayError> {
        let mut payload = payloads::pickup_location(location);
        payload["pickup_location"] = json!(location_name);

        self.call(
            OperationKind::PickupLocationUpdate,
            Method::POST,
            "settings/company/updatepickup",
            Some(&payload),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn remove_pickup_location(&self, location_name: &str) -> Result<Value, GatewayError> {
        self.call(
            OperationKind::PickupLocationDeletion,
            Method::POST,
            "settings/company/removepickup",
            Some(&payloads::pickup_location_name(location_name)),
        )
        .await
    }

    async fn print(
        &self,
        kind: OperationKind,
        path: &str,
        url_pointer: &str,
        ids: &[String],
    ) -> Result<Document, GatewayError> {
        let response = self.call(kind, Method::POST, path, Some(&payloads::ids(ids))).await?;
        Ok(Document { url: text_at(&response, url_pointer), response })
    }

    async fn call(
        &self,
        kind: OperationKind,
        method: Method,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Value, GatewayError> {
        match self.gateway.request(method, path, payload).await {
            Ok(response) => Ok(response),
            Err(err) => {
                let err = err.in_operation(kind);
                warn!(operation = %kind, error = %err, "carrier operation failed");
                Err(err)
            }
        }
    }

    /// A failed record is logged; the carrier call already succeeded.
    async fn record(&self, order_id: &str, update: ShipmentUpdate) {
        if update.is_empty() {
            return;
        }
        match self.recorder.record(order_id, &update).await {
            Ok(()) => info!(order_id, "shipment update recorded"),
            Err(err) => warn!(order_id, error = %err, "failed to record shipment update"),
        }
    }
}

/// Identifier or URL at `pointer`, accepting JSON strings and numbers.
fn text_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_at_reads_strings_and_numbers() {
        let value = json!({ "order_id": 123_456, "shipment_id": "987", "blank": "", "flag": true });
        assert_eq!(text_at(&value, "/order_id").as_deref(), Some("123456"));
        assert_eq!(text_at(&value, "/shipment_id").as_deref(), Some("987"));
        assert_eq!(text_at(&value, "/blank"), None);
        assert_eq!(text_at(&value, "/flag"), None);
        assert_eq!(text_at(&value, "/missing"), None);
    }
}

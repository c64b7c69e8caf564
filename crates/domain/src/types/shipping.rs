//! Typed inputs for carrier shipping operations and the sparse update
//! recorded back onto the caller's order.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COUNTRY, DEFAULT_PARCEL_DIMENSION_CM, DEFAULT_PARCEL_WEIGHT_KG};

/// Serviceability / rate lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateQuery {
    pub pickup_postcode: String,
    pub delivery_postcode: String,
    pub weight: f64,
    #[serde(default)]
    pub cod: bool,
    pub declared_value: f64,
}

/// Parcel dimensions in centimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub breadth: f64,
    pub height: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            length: DEFAULT_PARCEL_DIMENSION_CM,
            breadth: DEFAULT_PARCEL_DIMENSION_CM,
            height: DEFAULT_PARCEL_DIMENSION_CM,
        }
    }
}

/// Contact and postal address used for billing, pickup and shipping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub address: String,
    #[serde(default)]
    pub address_2: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub country: Option<String>,
    pub pincode: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub alternate_phone: String,
}

impl Address {
    pub fn country_or_default(&self) -> &str {
        self.country.as_deref().unwrap_or(DEFAULT_COUNTRY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub sku: String,
    pub units: u32,
    pub selling_price: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub hsn: Option<String>,
}

/// Forward order to be created with the carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Caller's own order id; also the key recorded against
    pub order_id: String,
    pub order_date: String,
    /// Carrier-registered pickup location name
    pub pickup_location: String,
    #[serde(default)]
    pub pickup_location_id: Option<String>,
    pub billing: Address,
    #[serde(default = "default_true")]
    pub shipping_is_billing: bool,
    pub items: Vec<OrderItem>,
    pub payment_method: String,
    pub sub_total: f64,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub weight: Option<f64>,
}

impl OrderRequest {
    pub fn dimensions_or_default(&self) -> Dimensions {
        self.dimensions.unwrap_or_default()
    }

    pub fn weight_or_default(&self) -> f64 {
        self.weight.unwrap_or(DEFAULT_PARCEL_WEIGHT_KG)
    }
}

/// Courier (AWB) assignment for an existing shipment.
///
/// Cost and ETA come from the rate lookup the caller picked the courier
/// from; the carrier does not echo them on assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierAssignment {
    pub order_id: String,
    pub shipment_id: String,
    #[serde(default)]
    pub courier_id: Option<String>,
    #[serde(default)]
    pub shipping_cost: Option<f64>,
    #[serde(default)]
    pub estimated_delivery_days: Option<String>,
}

/// Reverse pickup for a delivered order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnOrderRequest {
    /// Return order id sent to the carrier
    pub return_id: String,
    #[serde(default)]
    pub order_date: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Customer address the parcel is collected from
    pub pickup: Address,
    /// Warehouse address the parcel goes back to
    pub shipping: Address,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub payment_method: Option<String>,
    pub sub_total: f64,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    pub weight: f64,
}

/// Carrier-side pickup location (warehouse).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupLocation {
    pub location_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub address_2: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub country: Option<String>,
    pub pincode: String,
}

impl PickupLocation {
    pub fn country_or_default(&self) -> &str {
        self.country.as_deref().unwrap_or(DEFAULT_COUNTRY)
    }
}

/// Carrier identifiers and URLs to persist on the caller's order.
///
/// Only populated fields are written; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_location_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awb_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courier_company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courier_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery_days: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_shipment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_reason: Option<String>,
}

impl ShipmentUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

const fn default_true() -> bool {
    true
}

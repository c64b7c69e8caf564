//! Domain types and models

pub mod credential;
pub mod health;
pub mod shipping;

pub use credential::{Credential, CredentialKeys, Freshness, RefreshEvent, TokenStatus};
pub use health::{CarrierHealth, HealthState};
pub use shipping::{
    Address, CourierAssignment, Dimensions, OrderItem, OrderRequest, PickupLocation, RateQuery,
    ReturnOrderRequest, ShipmentUpdate,
};

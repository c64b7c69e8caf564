//! Carrier integration
//!
//! Login, the authenticated request gateway and the typed shipping
//! operations built on it.

pub mod auth;
pub mod endpoint;
pub mod errors;
pub mod gateway;
pub mod payloads;
pub mod recorder;
pub mod service;

pub use auth::{AccessTokenProvider, HttpCarrierAuthenticator};
pub use errors::{ErrorCategory, GatewayError, OperationKind};
pub use gateway::{Gateway, GatewayConfig};
pub use recorder::TracingShipmentRecorder;
pub use service::{
    AssignedCourier, CreatedOrder, Document, Manifest, ReturnOrder, ShippingService, Tracking,
};

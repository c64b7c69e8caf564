//! # Shipgate Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - HTTP client and carrier login
//! - The authenticated carrier `Gateway` and typed `ShippingService`
//! - Credential stores (in-process moka cache, optional Redis)
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `shipgate-core`
//! - Contains all "impure" code (network and store I/O)

pub mod carrier;
pub mod config;
pub mod errors;
pub mod http;
pub mod store;

// Re-export commonly used items
pub use carrier::{
    AccessTokenProvider, Gateway, GatewayConfig, GatewayError, HttpCarrierAuthenticator,
    ShippingService, TracingShipmentRecorder,
};
pub use errors::InfraError;
pub use http::HttpClient;
pub use store::InMemoryCredentialStore;
#[cfg(feature = "redis")]
pub use store::RedisCredentialStore;

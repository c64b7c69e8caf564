//! # Shipgate Core
//!
//! Carrier credential lifecycle - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the credential store, carrier login and the
//!   shipment side-effect hook
//! - `CredentialManager`: cached, single-flight credential refresh
//! - `CredentialRefresher`: periodic proactive refresh
//!
//! ## Architecture Principles
//! - Only depends on `shipgate-common` and `shipgate-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod credential_ports;
pub mod credentials;
pub mod shipment_ports;

pub use credential_ports::{CarrierAuthenticator, CredentialStore};
pub use credentials::{
    CredentialError, CredentialManager, CredentialRefresher, CredentialSettings, RefreshCheck,
    RefresherConfig, RefresherError,
};
pub use shipment_ports::ShipmentRecorder;

//! Carrier credential lifecycle
//!
//! [`CredentialManager`] hands out the shared bearer token, refreshing it
//! through a single in-flight login per process. [`CredentialRefresher`]
//! proactively refreshes tokens that are close to expiry.

pub mod error;
pub mod manager;
pub mod refresher;

pub use error::CredentialError;
pub use manager::{CredentialManager, CredentialSettings, RefreshCheck};
pub use refresher::{CredentialRefresher, RefresherConfig, RefresherError};

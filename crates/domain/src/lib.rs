//! # Shipgate Domain
//!
//! Domain types shared by every Shipgate crate.
//!
//! This crate contains:
//! - The domain error type and `Result` alias
//! - Configuration structures
//! - Credential, health and shipping payload types
//! - Domain constants (defaults carried by the carrier integration)
//!
//! ## Architecture
//! - No dependencies on other Shipgate crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;

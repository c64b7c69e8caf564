//! # Shipgate API
//!
//! Process layer - wiring, lifecycle and the health endpoint.
//!
//! This crate contains:
//! - Application context (dependency injection and lifecycle)
//! - HTTP routes (carrier health)
//! - Logging setup
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires the ports to their infrastructure implementations

pub mod context;
pub mod routes;
pub mod utils;

pub use context::AppContext;

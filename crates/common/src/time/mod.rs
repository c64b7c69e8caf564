//! Time abstractions
//!
//! Credential expiry is wall-clock based, so the clock here hands out
//! `chrono` UTC timestamps rather than monotonic instants.

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};

//! Credential store backends
//!
//! - [`InMemoryCredentialStore`]: per-process store for single-instance
//!   deployments and tests
//! - `RedisCredentialStore` (feature `redis`): shared across instances

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::InMemoryCredentialStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisCredentialStore;

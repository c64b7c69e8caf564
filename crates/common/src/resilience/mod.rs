//! Resilience patterns for transient failures
//!
//! Only bounded retry with backoff lives here. Callers decide what counts as
//! transient by supplying a [`RetryPolicy`].

pub mod retry;

pub use retry::{
    policies, BackoffStrategy, RetryConfig, RetryDecision, RetryError, RetryExecutor,
    RetryOutcome, RetryPolicy, RetryResult,
};

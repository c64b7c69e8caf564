//! Bounded retry with backoff
//!
//! The executor runs an async operation up to `max_attempts` times, sleeping
//! between attempts according to a [`BackoffStrategy`]. A [`RetryPolicy`]
//! decides per error whether another attempt is worthwhile. Sleeps go through
//! `tokio::time`, so tests can drive them with a paused clock.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Errors that end a retry sequence
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All attempts failed; carries the error from the final attempt
    #[error("all {attempts} attempts failed, last error: {last:?}")]
    Exhausted { attempts: u32, last: E },

    /// The policy refused to retry this error
    #[error("non-retryable error after {attempts} attempt(s): {source:?}")]
    NonRetryable { attempts: u32, source: E },

    /// The retry configuration is invalid
    #[error("invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::NonRetryable { attempts, .. } => *attempts,
            Self::InvalidConfiguration { .. } => 0,
        }
    }

    /// The underlying operation error, if any attempt ran.
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Exhausted { last, .. } => Some(last),
            Self::NonRetryable { source, .. } => Some(source),
            Self::InvalidConfiguration { .. } => None,
        }
    }
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Result of a retry sequence plus the delays actually slept.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: RetryResult<T, E>,
    pub attempts: u32,
    pub delays: Vec<Duration>,
}

impl<T, E> RetryOutcome<T, E> {
    pub fn into_result(self) -> RetryResult<T, E> {
        self.result
    }

    pub fn total_delay(&self) -> Duration {
        self.delays.iter().sum()
    }
}

/// Decides whether an error should be retried
pub trait RetryPolicy<E> {
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the configured backoff delay
    Retry,
    /// Retry after a caller-chosen delay
    RetryAfter(Duration),
    /// Give up and surface the error
    Stop,
}

/// Delay schedule between attempts
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Same delay every time
    Fixed(Duration),
    /// `initial_delay * base^attempt`, capped at `max_delay`
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Doubling backoff starting at `initial_delay` (2s, 4s, 8s, ...).
    pub fn doubling(initial_delay: Duration, max_delay: Duration) -> Self {
        Self::Exponential { initial_delay, base: 2.0, max_delay }
    }

    /// Delay to sleep after the failed attempt with 0-based index `attempt`.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let delay = initial_delay.as_secs_f64() * base.powi(exponent);
                if !delay.is_finite() || delay >= max_delay.as_secs_f64() {
                    *max_delay
                } else {
                    Duration::from_secs_f64(delay)
                }
            }
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::doubling(Duration::from_secs(2), Duration::from_secs(60)),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, backoff: BackoffStrategy) -> Self {
        Self { max_attempts, backoff }
    }

    pub fn validate(&self) -> Result<(), RetryError<()>> {
        if self.max_attempts == 0 {
            return Err(RetryError::InvalidConfiguration {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }

        if let BackoffStrategy::Exponential { base, .. } = &self.backoff {
            if *base <= 0.0 {
                return Err(RetryError::InvalidConfiguration {
                    message: "exponential base must be greater than 0".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Runs operations under a [`RetryConfig`] and [`RetryPolicy`].
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute an operation with retry logic.
    ///
    /// The closure receives the 1-based attempt number.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Debug,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    /// Execute an operation with retry logic and report the attempt count
    /// and the delays slept.
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Debug,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Err(err) = self.config.validate() {
            let message = err.to_string();
            return RetryOutcome {
                result: Err(RetryError::InvalidConfiguration { message }),
                attempts: 0,
                delays: Vec::new(),
            };
        }

        let max_attempts = self.config.max_attempts;
        let mut delays = Vec::new();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(attempt, max_attempts, "executing operation");

            let error = match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "operation succeeded after retry");
                    }
                    return RetryOutcome { result: Ok(value), attempts: attempt, delays };
                }
                Err(error) => error,
            };

            let delay = match self.policy.should_retry(&error, attempt - 1) {
                RetryDecision::Stop => {
                    debug!(attempt, error = ?error, "retry policy declined to retry");
                    return RetryOutcome {
                        result: Err(RetryError::NonRetryable { attempts: attempt, source: error }),
                        attempts: attempt,
                        delays,
                    };
                }
                RetryDecision::Retry => self.config.backoff.calculate_delay(attempt - 1),
                RetryDecision::RetryAfter(delay) => delay,
            };

            if attempt >= max_attempts {
                warn!(attempts = attempt, error = ?error, "all retry attempts exhausted");
                return RetryOutcome {
                    result: Err(RetryError::Exhausted { attempts: attempt, last: error }),
                    attempts: attempt,
                    delays,
                };
            }

            warn!(attempt, delay_ms = delay.as_millis() as u64, error = ?error, "operation failed, retrying");
            tokio::time::sleep(delay).await;
            delays.push(delay);
        }
    }
}

/// Pre-defined retry policies
pub mod policies {
    use super::{RetryDecision, RetryPolicy};

    /// Retries on any error
    #[derive(Debug, Clone, Copy, Default)]
    pub struct AlwaysRetry;

    impl<E> RetryPolicy<E> for AlwaysRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Retry
        }
    }

    /// Retries while the predicate returns true
    #[derive(Debug, Clone)]
    pub struct PredicateRetry<F> {
        predicate: F,
    }

    impl<F> PredicateRetry<F> {
        pub fn new(predicate: F) -> Self {
            Self { predicate }
        }
    }

    impl<F, E> RetryPolicy<E> for PredicateRetry<F>
    where
        F: Fn(&E, u32) -> bool,
    {
        fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision {
            if (self.predicate)(error, attempt) {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }
}

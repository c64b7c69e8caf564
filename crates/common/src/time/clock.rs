//! Wall-clock abstraction for testability
//!
//! ```
//! use chrono::Duration;
//! use shipgate_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now_utc();
//! clock.advance(Duration::seconds(5));
//! assert_eq!((clock.now_utc() - start).num_seconds(), 5);
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

/// Source of the current wall-clock time
pub trait Clock: Send + Sync + 'static {
    /// Current time in UTC
    fn now_utc(&self) -> DateTime<Utc>;

    /// Whole seconds since the UNIX epoch
    fn unix_seconds(&self) -> i64 {
        self.now_utc().timestamp()
    }
}

/// Real system clock, for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests
///
/// Clones share the same underlying time.
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Start at the current real time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Start at a fixed instant.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(now)) }
    }

    /// Start at the given UNIX timestamp; out-of-range values fall back to
    /// the epoch.
    pub fn from_unix_seconds(secs: i64) -> Self {
        Self::at(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

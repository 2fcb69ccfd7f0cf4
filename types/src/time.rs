//! Timestamps and the clock abstraction.
//!
//! Timestamps are Unix epoch milliseconds (UTC). The narrative delay after a
//! verification resolves is measured in these units.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A Unix timestamp in milliseconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_millis();
        Self(millis as u64)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Time elapsed since this timestamp (relative to `now`), zero if `now` is earlier.
    pub fn elapsed_since(&self, now: Timestamp) -> Duration {
        Duration::from_millis(now.0.saturating_sub(self.0))
    }

    /// Time left until this timestamp, as seen from `now`; zero once passed.
    pub fn remaining_from(&self, now: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(now.0))
    }

    pub fn saturating_add(&self, d: Duration) -> Self {
        let millis = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Monotonic clock anchored to the wall time at construction.
///
/// Driven by `tokio::time::Instant`, so it follows tokio's paused clock in
/// tests and never goes backwards when the system clock is adjusted.
pub struct MonotonicClock {
    wall_anchor: Timestamp,
    anchor: tokio::time::Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            wall_anchor: Timestamp::now(),
            anchor: tokio::time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.wall_anchor.saturating_add(self.anchor.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_saturates_at_zero() {
        let later = Timestamp::from_millis(5_000);
        let earlier = Timestamp::from_millis(1_000);
        assert_eq!(earlier.elapsed_since(later), Duration::from_secs(4));
        assert_eq!(later.elapsed_since(earlier), Duration::ZERO);
        assert_eq!(later.remaining_from(earlier), Duration::from_secs(4));
        assert_eq!(earlier.remaining_from(later), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn monotonic_clock_follows_paused_tokio_time() {
        let clock = MonotonicClock::new();
        let start = clock.now();
        tokio::time::advance(Duration::from_millis(2_000)).await;
        assert_eq!(start.elapsed_since(clock.now()), Duration::from_millis(2_000));
    }
}

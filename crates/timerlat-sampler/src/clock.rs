//! Monotonic nanosecond clock shared by a pool's workers and timers.

use std::time::{Duration, Instant};

/// Monotonic clock expressed as nanoseconds since a fixed origin.
///
/// Deadlines are plain `u64` nanosecond values so they can be compared,
/// subtracted, and stepped by a fixed period without `Instant` arithmetic.
/// Every sampler in a pool shares one origin, so their timestamps are
/// directly comparable.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Nanoseconds elapsed since the origin.
    #[inline]
    pub fn now_ns(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    /// The `Instant` corresponding to a nanosecond timestamp on this clock.
    #[inline]
    pub fn instant_at(&self, timestamp_ns: u64) -> Instant {
        self.origin
            .checked_add(Duration::from_nanos(timestamp_ns))
            .unwrap_or(self.origin)
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

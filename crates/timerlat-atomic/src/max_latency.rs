//! Shared maximum-latency tracker.
//!
//! [`MaxLatencyTracker`] holds the largest latency, in nanoseconds, reported by
//! any sampler since the tracker was created. It is written concurrently from
//! every core's timer callback and read once when sampling stops.
//!
//! # RT Safety
//!
//! [`MaxLatencyTracker::update`] is RT-safe:
//! - One atomic load on the fast path (value not raised)
//! - A bounded-by-contention compare-exchange loop otherwise
//! - No heap allocation, no blocking, no syscalls
//!
//! The loop only retries while another core is concurrently raising the
//! value, and it exits as soon as the stored maximum is already at least the
//! caller's latency, so it cannot livelock against callers reporting smaller
//! values.

use core::sync::atomic::{AtomicU64, Ordering};

/// Result of a single [`MaxLatencyTracker::update`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The latency became the new maximum.
    Raised {
        /// Maximum that was replaced.
        previous: u64,
    },
    /// The stored maximum was already at least the reported latency.
    Unchanged {
        /// Maximum observed when the update gave up.
        current: u64,
    },
}

impl UpdateOutcome {
    /// Returns true when this update raised the shared maximum.
    #[inline]
    #[must_use]
    pub const fn is_raised(&self) -> bool {
        matches!(self, UpdateOutcome::Raised { .. })
    }
}

/// Process-wide maximum latency, shared by all samplers.
///
/// # Thread Safety
///
/// All operations act on a single `AtomicU64`. A single memory location has
/// a total modification order, so `Relaxed` ordering is enough for the value
/// to be linearizable: every successful exchange replaces a value strictly
/// smaller than the one written, and no update is lost.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
/// use timerlat_atomic::MaxLatencyTracker;
///
/// let tracker = Arc::new(MaxLatencyTracker::new());
/// let handles: Vec<_> = (1..=4u64)
///     .map(|cpu| {
///         let tracker = Arc::clone(&tracker);
///         thread::spawn(move || tracker.update(cpu * 1_000))
///     })
///     .collect();
/// for handle in handles {
///     handle.join().ok();
/// }
/// assert_eq!(tracker.snapshot(), 4_000);
/// ```
#[derive(Debug, Default)]
pub struct MaxLatencyTracker {
    max_latency_ns: AtomicU64,
}

impl MaxLatencyTracker {
    /// Create a tracker whose maximum starts at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_value(0)
    }

    /// Create a tracker starting from a known maximum.
    #[must_use]
    pub const fn with_value(max_latency_ns: u64) -> Self {
        Self {
            max_latency_ns: AtomicU64::new(max_latency_ns),
        }
    }

    /// Ensure the shared maximum is at least `latency_ns`.
    ///
    /// Reads the current maximum and returns immediately if `latency_ns` is
    /// not greater. Otherwise tries to swap it in, retrying with the freshly
    /// observed value whenever another core got there first, until the swap
    /// succeeds or the stored maximum has been raised past `latency_ns`.
    ///
    /// # RT Safety
    ///
    /// RT-safe. See the module documentation.
    #[inline]
    pub fn update(&self, latency_ns: u64) -> UpdateOutcome {
        let mut current = self.max_latency_ns.load(Ordering::Relaxed);

        while latency_ns > current {
            match self.max_latency_ns.compare_exchange_weak(
                current,
                latency_ns,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(previous) => return UpdateOutcome::Raised { previous },
                Err(observed) => current = observed,
            }
        }

        UpdateOutcome::Unchanged { current }
    }

    /// Current maximum latency in nanoseconds.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> u64 {
        self.max_latency_ns.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_at_zero() {
        let tracker = MaxLatencyTracker::new();
        assert_eq!(tracker.snapshot(), 0);
    }

    #[test]
    fn test_update_raises_maximum() {
        let tracker = MaxLatencyTracker::new();

        assert_eq!(tracker.update(100), UpdateOutcome::Raised { previous: 0 });
        assert_eq!(tracker.update(250), UpdateOutcome::Raised { previous: 100 });
        assert_eq!(tracker.snapshot(), 250);
    }

    #[test]
    fn test_smaller_update_is_ignored() {
        let tracker = MaxLatencyTracker::with_value(500);

        assert_eq!(tracker.update(499), UpdateOutcome::Unchanged { current: 500 });
        assert_eq!(tracker.snapshot(), 500);
    }

    #[test]
    fn test_equal_update_is_not_a_raise() {
        let tracker = MaxLatencyTracker::with_value(500);

        let outcome = tracker.update(500);
        assert!(!outcome.is_raised());
        assert_eq!(tracker.snapshot(), 500);
    }

    #[test]
    fn test_zero_latency_on_fresh_tracker() {
        let tracker = MaxLatencyTracker::new();
        assert_eq!(tracker.update(0), UpdateOutcome::Unchanged { current: 0 });
    }

    #[test]
    fn test_extreme_value() {
        let tracker = MaxLatencyTracker::new();
        tracker.update(u64::MAX);
        assert_eq!(tracker.snapshot(), u64::MAX);
        assert!(!tracker.update(u64::MAX - 1).is_raised());
    }
}

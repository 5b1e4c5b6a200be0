//! Tracing metrics for observability

use core::sync::atomic::{AtomicU64, Ordering};

/// Metrics collected for tracing observability
///
/// Provides insight into the emission path's health. All counters are
/// monotonically increasing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TracingMetrics {
    /// Total number of latency events delivered to the sink
    pub rt_events_emitted: u64,

    /// Total number of lifecycle events emitted
    pub app_events_emitted: u64,

    /// Number of latency events dropped (sink contended or unavailable)
    pub events_dropped: u64,

    /// Number of delivered events that exceeded the threshold
    pub exceeded_events: u64,
}

impl TracingMetrics {
    /// Create new metrics with zero values
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate event drop rate
    pub fn drop_rate(&self) -> f64 {
        let total = self.rt_events_emitted.saturating_add(self.events_dropped);
        if total == 0 {
            return 0.0;
        }
        (self.events_dropped as f64) / (total as f64)
    }

    /// Check if health indicators are within acceptable bounds
    pub fn is_healthy(&self) -> bool {
        self.drop_rate() < 0.01
    }

    /// Merge metrics from another instance
    pub fn merge(&mut self, other: &TracingMetrics) {
        self.rt_events_emitted = self
            .rt_events_emitted
            .saturating_add(other.rt_events_emitted);
        self.app_events_emitted = self
            .app_events_emitted
            .saturating_add(other.app_events_emitted);
        self.events_dropped = self.events_dropped.saturating_add(other.events_dropped);
        self.exceeded_events = self.exceeded_events.saturating_add(other.exceeded_events);
    }
}

impl core::fmt::Display for TracingMetrics {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "TracingMetrics(rt={}, app={}, dropped={}, exceeded={}, drop_rate={:.4}%)",
            self.rt_events_emitted,
            self.app_events_emitted,
            self.events_dropped,
            self.exceeded_events,
            self.drop_rate() * 100.0
        )
    }
}

/// Lock-free counters shared by the providers in this crate.
///
/// Providers are called concurrently from every core's timer context, so
/// counting goes through relaxed atomics and a [`TracingMetrics`] value is
/// only materialized on request.
#[derive(Debug, Default)]
pub(crate) struct MetricCounters {
    rt_events: AtomicU64,
    app_events: AtomicU64,
    dropped: AtomicU64,
    exceeded: AtomicU64,
}

impl MetricCounters {
    pub(crate) const fn new() -> Self {
        Self {
            rt_events: AtomicU64::new(0),
            app_events: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            exceeded: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_rt_event(&self, exceeded: bool) {
        self.rt_events.fetch_add(1, Ordering::Relaxed);
        if exceeded {
            self.exceeded.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_app_event(&self) {
        self.app_events.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TracingMetrics {
        TracingMetrics {
            rt_events_emitted: self.rt_events.load(Ordering::Relaxed),
            app_events_emitted: self.app_events.load(Ordering::Relaxed),
            events_dropped: self.dropped.load(Ordering::Relaxed),
            exceeded_events: self.exceeded.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_default() {
        let m = TracingMetrics::default();
        assert_eq!(m.rt_events_emitted, 0);
        assert_eq!(m.app_events_emitted, 0);
        assert!(m.is_healthy());
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = MetricCounters::new();

        counters.record_rt_event(false);
        counters.record_rt_event(true);
        counters.record_app_event();
        counters.record_dropped();

        let m = counters.snapshot();
        assert_eq!(m.rt_events_emitted, 2);
        assert_eq!(m.exceeded_events, 1);
        assert_eq!(m.app_events_emitted, 1);
        assert_eq!(m.events_dropped, 1);
    }

    #[test]
    fn test_metrics_drop_rate() {
        let mut m = TracingMetrics::new();
        assert!(m.drop_rate().abs() < f64::EPSILON);

        m.rt_events_emitted = 99;
        m.events_dropped = 1;

        assert!((m.drop_rate() - 0.01).abs() < 0.0001);
        assert!(!m.is_healthy());
    }

    #[test]
    fn test_metrics_merge() {
        let mut m1 = TracingMetrics {
            rt_events_emitted: 100,
            exceeded_events: 5,
            ..Default::default()
        };

        let m2 = TracingMetrics {
            rt_events_emitted: 50,
            exceeded_events: 3,
            ..Default::default()
        };

        m1.merge(&m2);

        assert_eq!(m1.rt_events_emitted, 150);
        assert_eq!(m1.exceeded_events, 8);
    }

    #[test]
    fn test_metrics_merge_saturates() {
        let mut m = TracingMetrics {
            rt_events_emitted: u64::MAX,
            ..Default::default()
        };
        m.merge(&TracingMetrics {
            rt_events_emitted: 1,
            ..Default::default()
        });
        assert_eq!(m.rt_events_emitted, u64::MAX);
    }
}

//! Provider that discards latency events

use crate::metrics::MetricCounters;
use crate::{LatencyEvent, LifecycleEvent, TracingError, TracingMetrics, TracingProvider};

/// Discarding provider
///
/// Counts latency events without writing them anywhere. Lifecycle events
/// still go to the log. Useful when only the final maximum latency matters.
#[derive(Debug, Default)]
pub struct NullProvider {
    counters: MetricCounters,
}

impl NullProvider {
    /// Create a new discarding provider
    pub fn new() -> Self {
        Self::default()
    }
}

impl TracingProvider for NullProvider {
    fn initialize(&mut self) -> Result<(), TracingError> {
        Ok(())
    }

    #[inline]
    fn emit_rt_event(&self, event: LatencyEvent) {
        self.counters.record_rt_event(event.is_exceeded());
    }

    fn emit_app_event(&self, event: LifecycleEvent) {
        self.counters.record_app_event();
        crate::platform::log_lifecycle_event(&event);
    }

    fn metrics(&self) -> TracingMetrics {
        self.counters.snapshot()
    }

    fn shutdown(&mut self) {}
}

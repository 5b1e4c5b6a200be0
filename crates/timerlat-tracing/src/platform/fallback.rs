//! Structured-logging provider, used where no native trace sink exists

use crate::metrics::MetricCounters;
use crate::{LatencyEvent, LifecycleEvent, TracingError, TracingMetrics, TracingProvider};

/// Structured-logging provider
///
/// Routes latency events through `tracing`: ordinary samples at `TRACE`,
/// exceeded samples at `WARN`. With a typical `info`-level filter only the
/// threshold violations reach the log.
///
/// # RT Safety
///
/// RT-safe only as far as the installed subscriber is. Filtered-out `TRACE`
/// events cost a callsite check; enabled events run the subscriber inline.
/// Prefer [`TraceMarkerProvider`](super::TraceMarkerProvider) for long runs
/// on Linux.
pub struct LogProvider {
    counters: MetricCounters,
}

impl Default for LogProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LogProvider {
    /// Create a new logging provider
    pub fn new() -> Self {
        Self {
            counters: MetricCounters::new(),
        }
    }
}

impl TracingProvider for LogProvider {
    fn initialize(&mut self) -> Result<(), TracingError> {
        tracing::info!("Using structured logging for latency events");
        Ok(())
    }

    fn emit_rt_event(&self, event: LatencyEvent) {
        match event {
            LatencyEvent::Sample { cpu, latency_ns } => {
                tracing::trace!(cpu, latency_ns, "timerlat sample");
            }
            LatencyEvent::Exceeded {
                cpu,
                latency_ns,
                threshold_ns,
            } => {
                tracing::warn!(cpu, latency_ns, threshold_ns, "timerlat latency exceeded");
            }
        }
        self.counters.record_rt_event(event.is_exceeded());
    }

    fn emit_app_event(&self, event: LifecycleEvent) {
        log_lifecycle_event(&event);
        self.counters.record_app_event();
    }

    fn metrics(&self) -> TracingMetrics {
        self.counters.snapshot()
    }

    fn shutdown(&mut self) {
        tracing::debug!("Logging provider shutdown");
    }
}

/// Log a lifecycle event with structured fields.
pub(crate) fn log_lifecycle_event(event: &LifecycleEvent) {
    match event {
        LifecycleEvent::SamplerStarted { cpu } => {
            tracing::debug!(cpu, "Sampler started");
        }
        LifecycleEvent::SamplerStopped { cpu } => {
            tracing::debug!(cpu, "Sampler stopped");
        }
        LifecycleEvent::SamplerStartFailed { cpu, reason } => {
            tracing::error!(cpu, reason = %reason, "Could not start sampling thread on cpu {cpu}");
        }
        LifecycleEvent::SamplingFinished { max_latency_ns } => {
            tracing::warn!(max_latency_ns, "Max latency: {max_latency_ns}");
        }
    }
}

impl core::fmt::Debug for LogProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LogProvider")
            .field("metrics", &self.counters.snapshot())
            .finish()
    }
}

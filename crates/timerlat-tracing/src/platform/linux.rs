//! ftrace `trace_marker` provider

use crate::metrics::MetricCounters;
use crate::{LatencyEvent, LifecycleEvent, TracingError, TracingMetrics, TracingProvider};
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

/// tracefs mount points probed in order when no explicit path is given
const TRACE_MARKER_PATHS: [&str; 2] = [
    "/sys/kernel/tracing/trace_marker",
    "/sys/kernel/debug/tracing/trace_marker",
];

/// Longest formatted line: an `Exceeded` event with every field at its maximum
const LINE_CAPACITY: usize = 128;

/// ftrace `trace_marker` provider
///
/// Writes one line per latency event into the kernel trace buffer, e.g.
/// `timerlat_sample cpu=3 latency_ns=4120`, so samples can be correlated
/// with scheduler and IRQ tracepoints.
///
/// # RT Safety
///
/// - Lines are formatted into a fixed stack buffer, no allocation
/// - Each event is a single `write(2)` through a shared `&File`; the kernel
///   keeps marker writes atomic, so cores never wait on each other
/// - A short or failed write drops the event and counts it
///
/// # Permissions
///
/// Requires write access to tracefs, typically root.
pub struct TraceMarkerProvider {
    path: Option<PathBuf>,
    trace_file: Option<File>,
    counters: MetricCounters,
}

impl TraceMarkerProvider {
    /// Create a provider that probes the standard tracefs locations
    pub fn new() -> Self {
        Self {
            path: None,
            trace_file: None,
            counters: MetricCounters::new(),
        }
    }

    /// Create a provider writing to an explicit marker file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            trace_file: None,
            counters: MetricCounters::new(),
        }
    }

    fn open_marker(path: &Path) -> std::io::Result<File> {
        File::options().append(true).open(path)
    }

    /// Format an event as a newline-terminated line, returning its length.
    fn format_rt_event(event: LatencyEvent, buf: &mut [u8; LINE_CAPACITY]) -> usize {
        let mut cursor = Cursor::new(&mut buf[..]);
        if writeln!(cursor, "{event}").is_err() {
            // Truncated lines are still written; the prefix identifies the event
            tracing::trace!("trace_marker line truncated");
        }
        usize::try_from(cursor.position()).unwrap_or(LINE_CAPACITY)
    }
}

impl TracingProvider for TraceMarkerProvider {
    fn initialize(&mut self) -> Result<(), TracingError> {
        let candidates: Vec<PathBuf> = match &self.path {
            Some(path) => vec![path.clone()],
            None => TRACE_MARKER_PATHS.iter().map(PathBuf::from).collect(),
        };

        let mut last_error = None;
        for candidate in candidates {
            match Self::open_marker(&candidate) {
                Ok(mut file) => {
                    writeln!(file, "timerlat: tracing initialized")
                        .map_err(|e| TracingError::init_failed(format!("{}: {e}", candidate.display())))?;
                    tracing::info!(path = %candidate.display(), "trace_marker initialized");
                    self.trace_file = Some(file);
                    self.path = Some(candidate);
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(path = %candidate.display(), error = %e, "trace_marker unavailable");
                    last_error = Some(format!("{}: {e}", candidate.display()));
                }
            }
        }

        Err(TracingError::init_failed(
            last_error.unwrap_or_else(|| "no trace_marker candidates".to_string()),
        ))
    }

    fn emit_rt_event(&self, event: LatencyEvent) {
        let Some(mut file) = self.trace_file.as_ref() else {
            self.counters.record_dropped();
            return;
        };

        let mut buf = [0u8; LINE_CAPACITY];
        let len = Self::format_rt_event(event, &mut buf);
        let Some(line) = buf.get(..len) else {
            self.counters.record_dropped();
            return;
        };

        // One write per line; a partial line is never completed by a second call
        match file.write(line) {
            Ok(written) if written == line.len() => {
                self.counters.record_rt_event(event.is_exceeded());
            }
            _ => self.counters.record_dropped(),
        }
    }

    fn emit_app_event(&self, event: LifecycleEvent) {
        crate::platform::log_lifecycle_event(&event);

        if let Some(mut file) = self.trace_file.as_ref() {
            if let Err(e) = writeln!(file, "timerlat: {event}") {
                tracing::debug!(error = %e, "trace_marker lifecycle write failed");
            }
        }

        self.counters.record_app_event();
    }

    fn metrics(&self) -> TracingMetrics {
        self.counters.snapshot()
    }

    fn is_enabled(&self) -> bool {
        self.trace_file.is_some()
    }

    fn shutdown(&mut self) {
        if let Some(mut file) = self.trace_file.take() {
            if let Err(e) = writeln!(file, "timerlat: tracing shutdown") {
                tracing::debug!(error = %e, "trace_marker shutdown write failed");
            }
        }
        tracing::info!("trace_marker provider shutdown");
    }
}

impl core::fmt::Debug for TraceMarkerProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TraceMarkerProvider")
            .field("path", &self.path)
            .field("trace_file", &self.trace_file.is_some())
            .field("metrics", &self.counters.snapshot())
            .finish()
    }
}

impl Default for TraceMarkerProvider {
    fn default() -> Self {
        Self::new()
    }
}

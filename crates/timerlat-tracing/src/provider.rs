//! Tracing provider trait definition

use core::fmt;
use core::str::FromStr;

use crate::{LatencyEvent, LifecycleEvent, TracingError, TracingMetrics};

/// Latency sink trait
///
/// Implementations must provide RT-safe event emission for [`LatencyEvent`].
/// The [`emit_rt_event`](TracingProvider::emit_rt_event) method has strict
/// requirements:
///
/// # RT-Safety Requirements
///
/// - Must not allocate memory
/// - Must not block
/// - Must not acquire locks that could block
/// - Must complete in bounded time
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: every core's timer context calls
/// the same provider concurrently.
pub trait TracingProvider: Send + Sync {
    /// Initialize the tracing provider
    ///
    /// Called once before sampling starts; may perform I/O.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be opened.
    fn initialize(&mut self) -> Result<(), TracingError>;

    /// Emit a latency event
    ///
    /// This method must be RT-safe. See trait documentation for requirements.
    fn emit_rt_event(&self, event: LatencyEvent);

    /// Emit a lifecycle event
    ///
    /// This method is NOT RT-safe. It may allocate and block.
    fn emit_app_event(&self, event: LifecycleEvent);

    /// Get current tracing metrics
    fn metrics(&self) -> TracingMetrics;

    /// Check if the provider is enabled
    ///
    /// Returns true if the provider can emit events.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Shutdown the provider
    ///
    /// Called after every sampler has stopped. May perform blocking operations.
    fn shutdown(&mut self);
}

/// Which sink latency events are routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkKind {
    /// `trace_marker` when available, structured logging otherwise
    #[default]
    Auto,
    /// ftrace `trace_marker` only (Linux)
    TraceMarker,
    /// Structured logging through `tracing`
    Log,
    /// Discard events, count only
    Null,
}

impl SinkKind {
    /// Canonical name used on the command line and in config files
    pub const fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Auto => "auto",
            SinkKind::TraceMarker => "trace-marker",
            SinkKind::Log => "log",
            SinkKind::Null => "null",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkKind {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SinkKind::Auto),
            "trace-marker" | "trace_marker" | "ftrace" => Ok(SinkKind::TraceMarker),
            "log" => Ok(SinkKind::Log),
            "null" | "none" => Ok(SinkKind::Null),
            other => Err(TracingError::InvalidConfiguration(format!(
                "unknown sink '{other}'"
            ))),
        }
    }
}

/// Create an uninitialized provider for the requested sink
///
/// `Auto` resolves to the platform-native sink: `trace_marker` on Linux,
/// structured logging elsewhere.
///
/// # Errors
///
/// Returns [`TracingError::PlatformNotSupported`] when `TraceMarker` is
/// requested on a platform without ftrace.
pub fn create_provider(kind: SinkKind) -> Result<Box<dyn TracingProvider>, TracingError> {
    match kind {
        SinkKind::Auto => Ok(create_platform_provider()),
        SinkKind::TraceMarker => {
            #[cfg(target_os = "linux")]
            {
                Ok(Box::new(crate::platform::TraceMarkerProvider::new()))
            }

            #[cfg(not(target_os = "linux"))]
            {
                Err(TracingError::PlatformNotSupported("trace-marker"))
            }
        }
        SinkKind::Log => Ok(Box::new(crate::platform::LogProvider::new())),
        SinkKind::Null => Ok(Box::new(crate::platform::NullProvider::new())),
    }
}

/// Create the platform-native provider
///
/// - Linux: `TraceMarkerProvider`
/// - Other: `LogProvider`
pub fn create_platform_provider() -> Box<dyn TracingProvider> {
    #[cfg(target_os = "linux")]
    {
        Box::new(crate::platform::TraceMarkerProvider::new())
    }

    #[cfg(not(target_os = "linux"))]
    {
        Box::new(crate::platform::LogProvider::new())
    }
}

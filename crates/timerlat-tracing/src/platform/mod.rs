//! Platform-specific tracing providers

mod fallback;
mod null;

#[cfg(target_os = "linux")]
mod linux;

pub use fallback::LogProvider;
pub use null::NullProvider;

#[cfg(target_os = "linux")]
pub use linux::TraceMarkerProvider;

pub(crate) use fallback::log_lifecycle_event;

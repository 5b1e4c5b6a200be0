//! Tracing error types

use core::fmt;

/// Tracing errors
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// Sink not available on this platform
    #[error("Tracing sink not supported on this platform: {0}")]
    PlatformNotSupported(&'static str),

    /// Provider initialization failed
    #[error("Tracing provider initialization failed: {0}")]
    InitializationFailed(String),

    /// Invalid configuration
    #[error("Invalid tracing configuration: {0}")]
    InvalidConfiguration(String),
}

impl TracingError {
    /// Check if falling back to another sink can recover from this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            TracingError::PlatformNotSupported(_) => true,
            TracingError::InitializationFailed(_) => true,
            TracingError::InvalidConfiguration(_) => false,
        }
    }

    /// Create an initialization error with context
    pub fn init_failed(context: impl fmt::Display) -> Self {
        TracingError::InitializationFailed(context.to_string())
    }
}

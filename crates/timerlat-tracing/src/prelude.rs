//! Prelude for latency event emission.
//!
//! ```rust
//! use timerlat_tracing::prelude::*;
//! ```

pub use crate::error::TracingError;
pub use crate::events::{LatencyEvent, LifecycleEvent};
pub use crate::manager::TracingManager;
pub use crate::metrics::TracingMetrics;
pub use crate::provider::{SinkKind, TracingProvider};

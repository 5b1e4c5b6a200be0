//! RT-safe latency event emission for timerlat samplers
//!
//! Samplers report every measured wake latency as a [`LatencyEvent`]. This
//! crate routes those events to an external sink:
//! - **Linux**: the ftrace `trace_marker` file, so samples land in the kernel
//!   trace buffer next to scheduler events
//! - **Other platforms / no tracefs access**: structured logging via `tracing`
//!
//! # RT-Safety Guarantees
//!
//! [`TracingProvider::emit_rt_event`] is called from every core's timer
//! context and must be RT-safe:
//! - No heap allocations
//! - No blocking (contended sinks drop the event and count it)
//! - Bounded execution time
//!
//! # Example
//!
//! ```rust,ignore
//! use timerlat_tracing::{LatencyEvent, SinkKind, TracingManager};
//!
//! let manager = TracingManager::for_sink(SinkKind::Auto)?;
//!
//! manager.emit_rt_event(LatencyEvent::Sample {
//!     cpu: 0,
//!     latency_ns: 4_200,
//! });
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod events;
pub mod manager;
pub mod metrics;
pub mod platform;
pub mod prelude;
pub mod provider;

pub use error::TracingError;
pub use events::{LatencyEvent, LifecycleEvent};
pub use manager::TracingManager;
pub use metrics::TracingMetrics;
pub use provider::{SinkKind, TracingProvider};

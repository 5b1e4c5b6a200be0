//! Per-core wake latency sampling with absolute-deadline timers.
//!
//! On every active core a [`Sampler`] runs a pinned worker thread and a
//! pinned timer thread. The worker arms a one-shot timer for an absolute
//! deadline and parks; the timer thread wakes at the deadline, measures how
//! late it is, emits the sample and wakes the worker, which steps the
//! deadline by one period. The result is a measurement of how promptly each
//! core can run a high-priority timer context.
//!
//! - **SamplerPool**: one sampler per active core, all-or-nothing start
//! - **SamplerContext**: shared tracker, runtime knobs, and event sink
//! - **PinnedTimer**: one-shot timer with synchronous cancel
//! - **CpuTopology**: active core enumeration with a hotplug guard
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use timerlat_atomic::MaxLatencyTracker;
//! use timerlat_sampler::{RuntimeConfig, SamplerConfig, SamplerContext, SamplerPool};
//! use timerlat_tracing::{SinkKind, TracingManager};
//!
//! let tracker = Arc::new(MaxLatencyTracker::new());
//! let ctx = SamplerContext::new(
//!     Arc::clone(&tracker),
//!     Arc::new(RuntimeConfig::default()),
//!     Arc::new(TracingManager::for_sink(SinkKind::Log)?),
//! );
//!
//! let mut pool = SamplerPool::new(ctx, SamplerConfig::default());
//! pool.start()?;
//! std::thread::sleep(std::time::Duration::from_millis(500));
//! pool.stop();
//!
//! println!("max latency {} ns", tracker.snapshot());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(unused_must_use)]

pub mod affinity;
pub mod clock;
pub mod config;
pub mod error;
pub mod handoff;
pub mod pool;
pub mod sampler;
pub mod timer;
pub mod topology;

mod rt_setup;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(target_os = "linux"))]
mod fallback;

pub mod prelude;

pub use affinity::{CoreBinder, SchedAffinity, Unpinned, current_cpu};
pub use clock::MonotonicClock;
pub use config::{RuntimeConfig, RuntimeSettings, SamplerConfig};
pub use error::{PoolError, PoolResult, SamplerError, SamplerResult, ThreadRole, TopologyError};
pub use handoff::{Handoff, Wake};
pub use pool::SamplerPool;
pub use sampler::{DeadlineSchedule, FireObserver, Sampler, SamplerContext, SamplerFactory};
pub use timer::{PinnedTimer, TimerFire};
pub use topology::{
    CpuTopology, MAX_CPUS, StaticTopology, SystemTopology, TopologySnapshot, parse_cpu_list,
};

/// Default sampling period in nanoseconds (1 ms)
pub const DEFAULT_PERIOD_NS: u64 = config::DEFAULT_PERIOD_US * 1_000;

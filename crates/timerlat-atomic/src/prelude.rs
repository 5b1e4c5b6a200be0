//! Prelude module for common tracker types.
//!
//! ```rust
//! use timerlat_atomic::prelude::*;
//!
//! let tracker = MaxLatencyTracker::new();
//! assert_eq!(tracker.update(5), UpdateOutcome::Raised { previous: 0 });
//! ```

pub use crate::max_latency::{MaxLatencyTracker, UpdateOutcome};

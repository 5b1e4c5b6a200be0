//! # timerlat-atomic
//!
//! Lock-free shared state for per-core timer latency sampling.
//!
//! Every sampler on every core reports its observed wake latency into one
//! process-wide maximum. This crate provides that maximum as
//! [`MaxLatencyTracker`], an `AtomicU64` updated with a compare-and-retry
//! loop so that the hot path never takes a lock.
//!
//! ## Safety Guarantees
//!
//! - **No heap allocations**
//! - **No blocking operations** - updates are lock-free
//! - **No syscalls**
//! - **Linearizable** - after all updates complete the value equals the
//!   maximum of every value passed in, regardless of interleaving
//!
//! ## Usage
//!
//! ```rust
//! use timerlat_atomic::MaxLatencyTracker;
//!
//! let tracker = MaxLatencyTracker::new();
//!
//! // Called from each core's timer callback
//! tracker.update(12_500);
//! tracker.update(8_000);
//!
//! // Read once at shutdown
//! assert_eq!(tracker.snapshot(), 12_500);
//! ```

#![no_std]
#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod max_latency;
pub mod prelude;

pub use max_latency::{MaxLatencyTracker, UpdateOutcome};

//! Sampler configuration.
//!
//! Two kinds of settings drive a run:
//!
//! - [`SamplerConfig`] is fixed for the lifetime of a pool: sampling period,
//!   thread priorities, pinning.
//! - [`RuntimeConfig`] holds the knobs an operator may change while sampling
//!   runs. Every timer callback reads them with relaxed atomics, so a change
//!   takes effect on each core at its next fire.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// Default sampling period in microseconds (1 kHz)
pub const DEFAULT_PERIOD_US: u64 = 1_000;

/// Longest accepted sampling period in microseconds (1 s)
pub const MAX_PERIOD_US: u64 = 1_000_000;

/// Highest `SCHED_FIFO` priority accepted by Linux
pub const MAX_RT_PRIORITY: u8 = 99;

/// Static configuration for every sampler in a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerConfig {
    /// Period between consecutive deadlines, in microseconds.
    pub period_us: u64,

    /// `SCHED_FIFO` priority of the timer thread (0 = leave the default
    /// policy). The timer context must outrank the worker.
    pub timer_priority: u8,

    /// `SCHED_FIFO` priority of the worker thread (0 = leave the default
    /// policy).
    pub worker_priority: u8,

    /// Pin both threads of each sampler to its core.
    pub pin_threads: bool,

    /// Lock current and future pages in memory before sampling starts.
    pub lock_memory: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            period_us: DEFAULT_PERIOD_US,
            timer_priority: 95,
            worker_priority: 90,
            pin_threads: true,
            lock_memory: false,
        }
    }
}

impl SamplerConfig {
    /// Configuration suited to tests: no RT priorities, no memory locking.
    pub fn testing() -> Self {
        Self {
            timer_priority: 0,
            worker_priority: 0,
            ..Self::default()
        }
    }

    /// Set the sampling period.
    pub fn with_period_us(mut self, period_us: u64) -> Self {
        self.period_us = period_us;
        self
    }

    /// Set thread pinning.
    pub fn with_pin_threads(mut self, enabled: bool) -> Self {
        self.pin_threads = enabled;
        self
    }

    /// Sampling period in nanoseconds.
    #[inline]
    pub fn period_ns(&self) -> u64 {
        self.period_us.saturating_mul(1_000)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.period_us == 0 || self.period_us > MAX_PERIOD_US {
            return Err(format!(
                "period_us must be in 1..={MAX_PERIOD_US}, got {}",
                self.period_us
            ));
        }

        for (name, priority) in [
            ("timer_priority", self.timer_priority),
            ("worker_priority", self.worker_priority),
        ] {
            if priority > MAX_RT_PRIORITY {
                return Err(format!(
                    "{name} must be at most {MAX_RT_PRIORITY}, got {priority}"
                ));
            }
        }

        if self.worker_priority > 0 && self.worker_priority >= self.timer_priority {
            return Err(format!(
                "timer_priority ({}) must be higher than worker_priority ({})",
                self.timer_priority, self.worker_priority
            ));
        }

        Ok(())
    }
}

/// Serializable form of the runtime knobs, used in config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeSettings {
    /// Threshold in microseconds above which a sample is `Exceeded`
    /// (zero or negative disables classification).
    pub latency_threshold_us: i64,

    /// Intended to halt sampling once the threshold is exceeded. Stored and
    /// reported, but not consulted by the sampling loop.
    pub stop_on_exceeded: bool,
}

/// Operator-tunable knobs shared by every timer callback.
///
/// Reads and writes are relaxed: a callback racing with an update sees
/// either the old or the new value, which is acceptable for a threshold.
#[derive(Debug, Default)]
pub struct RuntimeConfig {
    latency_threshold_us: AtomicI64,
    stop_on_exceeded: AtomicBool,
}

impl RuntimeConfig {
    /// Create runtime knobs from their initial values.
    pub fn new(settings: RuntimeSettings) -> Self {
        Self {
            latency_threshold_us: AtomicI64::new(settings.latency_threshold_us),
            stop_on_exceeded: AtomicBool::new(settings.stop_on_exceeded),
        }
    }

    /// Current threshold in microseconds.
    #[inline]
    pub fn latency_threshold_us(&self) -> i64 {
        self.latency_threshold_us.load(Ordering::Relaxed)
    }

    /// Change the threshold; takes effect at each core's next timer fire.
    pub fn set_latency_threshold_us(&self, threshold_us: i64) {
        self.latency_threshold_us
            .store(threshold_us, Ordering::Relaxed);
    }

    /// Threshold in nanoseconds, or `None` when classification is disabled.
    #[inline]
    pub fn threshold_ns(&self) -> Option<u64> {
        let threshold_us = self.latency_threshold_us();
        u64::try_from(threshold_us)
            .ok()
            .filter(|&us| us > 0)
            .map(|us| us.saturating_mul(1_000))
    }

    /// Current `stop_on_exceeded` flag.
    #[inline]
    pub fn stop_on_exceeded(&self) -> bool {
        self.stop_on_exceeded.load(Ordering::Relaxed)
    }

    /// Change the `stop_on_exceeded` flag.
    pub fn set_stop_on_exceeded(&self, enabled: bool) {
        self.stop_on_exceeded.store(enabled, Ordering::Relaxed);
    }

    /// Snapshot the knobs in their serializable form.
    pub fn settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            latency_threshold_us: self.latency_threshold_us(),
            stop_on_exceeded: self.stop_on_exceeded(),
        }
    }
}

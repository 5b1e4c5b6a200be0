//! Event definitions for latency samples and sampler lifecycle

use core::fmt;

/// Latency events emitted from a sampler's timer context
///
/// # RT-Safety
///
/// All variants are `Copy` and fixed-size, so building and passing one never
/// allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyEvent {
    /// Ordinary latency sample
    ///
    /// Emitted when no threshold is configured, or the latency is at or
    /// below the threshold.
    Sample {
        /// Core the sample was taken on
        cpu: u32,
        /// Wake latency in nanoseconds
        latency_ns: u64,
    },

    /// Latency sample above the configured threshold
    Exceeded {
        /// Core the sample was taken on
        cpu: u32,
        /// Wake latency in nanoseconds
        latency_ns: u64,
        /// Threshold that was exceeded, in nanoseconds
        threshold_ns: u64,
    },
}

impl LatencyEvent {
    /// Classify a measured latency against an optional threshold.
    ///
    /// A latency is `Exceeded` only when a threshold is present and the
    /// latency is strictly greater than it; a latency equal to the threshold
    /// is still a `Sample`.
    #[inline]
    pub const fn classify(cpu: u32, latency_ns: u64, threshold_ns: Option<u64>) -> Self {
        match threshold_ns {
            Some(threshold_ns) if latency_ns > threshold_ns => LatencyEvent::Exceeded {
                cpu,
                latency_ns,
                threshold_ns,
            },
            _ => LatencyEvent::Sample { cpu, latency_ns },
        }
    }

    /// Returns the event type as a string for logging/tracing
    #[inline]
    pub const fn event_type(&self) -> &'static str {
        match self {
            LatencyEvent::Sample { .. } => "timerlat_sample",
            LatencyEvent::Exceeded { .. } => "timerlat_exceeded",
        }
    }

    /// Returns the core this event was measured on
    #[inline]
    pub const fn cpu(&self) -> u32 {
        match self {
            LatencyEvent::Sample { cpu, .. } | LatencyEvent::Exceeded { cpu, .. } => *cpu,
        }
    }

    /// Returns the measured latency in nanoseconds
    #[inline]
    pub const fn latency_ns(&self) -> u64 {
        match self {
            LatencyEvent::Sample { latency_ns, .. } | LatencyEvent::Exceeded { latency_ns, .. } => {
                *latency_ns
            }
        }
    }

    /// Returns true if this sample exceeded the threshold
    #[inline]
    pub const fn is_exceeded(&self) -> bool {
        matches!(self, LatencyEvent::Exceeded { .. })
    }
}

/// Non-RT events describing the sampler pool lifecycle
///
/// These may allocate and must not be emitted from a timer context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A sampler is running on a core
    SamplerStarted {
        /// Core the sampler is pinned to
        cpu: u32,
    },

    /// A sampler has stopped and its timer is cancelled
    SamplerStopped {
        /// Core the sampler was pinned to
        cpu: u32,
    },

    /// A sampler could not be created; the pool rolled back
    SamplerStartFailed {
        /// Core on which creation failed
        cpu: u32,
        /// Human-readable failure reason
        reason: String,
    },

    /// Sampling finished and the final maximum is known
    SamplingFinished {
        /// Largest latency observed across all cores, in nanoseconds
        max_latency_ns: u64,
    },
}

impl LifecycleEvent {
    /// Returns the core this event refers to, if any
    pub fn cpu(&self) -> Option<u32> {
        match self {
            LifecycleEvent::SamplerStarted { cpu }
            | LifecycleEvent::SamplerStopped { cpu }
            | LifecycleEvent::SamplerStartFailed { cpu, .. } => Some(*cpu),
            LifecycleEvent::SamplingFinished { .. } => None,
        }
    }
}

impl fmt::Display for LatencyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatencyEvent::Sample { cpu, latency_ns } => {
                write!(f, "timerlat_sample cpu={cpu} latency_ns={latency_ns}")
            }
            LatencyEvent::Exceeded {
                cpu,
                latency_ns,
                threshold_ns,
            } => write!(
                f,
                "timerlat_exceeded cpu={cpu} latency_ns={latency_ns} threshold_ns={threshold_ns}"
            ),
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleEvent::SamplerStarted { cpu } => write!(f, "SamplerStarted(cpu={cpu})"),
            LifecycleEvent::SamplerStopped { cpu } => write!(f, "SamplerStopped(cpu={cpu})"),
            LifecycleEvent::SamplerStartFailed { cpu, reason } => {
                write!(f, "SamplerStartFailed(cpu={cpu}, reason={reason})")
            }
            LifecycleEvent::SamplingFinished { max_latency_ns } => {
                write!(f, "SamplingFinished(max_latency_ns={max_latency_ns})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_without_threshold() {
        let event = LatencyEvent::classify(2, u64::MAX, None);
        assert_eq!(
            event,
            LatencyEvent::Sample {
                cpu: 2,
                latency_ns: u64::MAX
            }
        );
    }

    #[test]
    fn test_classify_boundary() {
        let at = LatencyEvent::classify(0, 50_000, Some(50_000));
        assert!(!at.is_exceeded());

        let above = LatencyEvent::classify(0, 50_001, Some(50_000));
        assert_eq!(
            above,
            LatencyEvent::Exceeded {
                cpu: 0,
                latency_ns: 50_001,
                threshold_ns: 50_000
            }
        );
    }

    #[test]
    fn test_accessors() {
        let event = LatencyEvent::Exceeded {
            cpu: 7,
            latency_ns: 1234,
            threshold_ns: 1000,
        };
        assert_eq!(event.cpu(), 7);
        assert_eq!(event.latency_ns(), 1234);
        assert_eq!(event.event_type(), "timerlat_exceeded");
    }

    #[test]
    fn test_lifecycle_cpu() {
        assert_eq!(LifecycleEvent::SamplerStarted { cpu: 3 }.cpu(), Some(3));
        assert_eq!(
            LifecycleEvent::SamplingFinished { max_latency_ns: 9 }.cpu(),
            None
        );
    }

    #[test]
    fn test_event_display() {
        let s = LatencyEvent::Sample {
            cpu: 1,
            latency_ns: 900,
        }
        .to_string();
        assert_eq!(s, "timerlat_sample cpu=1 latency_ns=900");
    }
}

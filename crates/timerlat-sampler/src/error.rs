//! Error types for the sampler crate.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Which of a sampler's two threads an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadRole {
    /// The worker that parks between timer fires
    Worker,
    /// The higher-priority thread that runs timer callbacks
    Timer,
}

impl fmt::Display for ThreadRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadRole::Worker => f.write_str("worker"),
            ThreadRole::Timer => f.write_str("timer"),
        }
    }
}

/// Failure to construct a sampler on one core.
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    /// The OS refused to create a thread
    #[error("failed to spawn {role} thread for cpu {cpu}: {source}")]
    Spawn {
        /// Core the sampler was being created for
        cpu: u32,
        /// Thread that could not be created
        role: ThreadRole,
        /// Underlying OS error
        source: io::Error,
    },

    /// A thread could not be pinned to its core
    #[error("failed to pin {role} thread to cpu {cpu}: {source}")]
    Affinity {
        /// Core the sampler was being created for
        cpu: u32,
        /// Thread that could not be pinned
        role: ThreadRole,
        /// Underlying OS error
        source: io::Error,
    },

    /// A thread exited before reporting that it was ready
    #[error("{role} thread for cpu {cpu} exited during startup")]
    ThreadExited {
        /// Core the sampler was being created for
        cpu: u32,
        /// Thread that exited
        role: ThreadRole,
    },
}

impl SamplerError {
    /// Core on which construction failed
    pub fn cpu(&self) -> u32 {
        match self {
            SamplerError::Spawn { cpu, .. }
            | SamplerError::Affinity { cpu, .. }
            | SamplerError::ThreadExited { cpu, .. } => *cpu,
        }
    }

    /// Thread that caused the failure
    pub fn role(&self) -> ThreadRole {
        match self {
            SamplerError::Spawn { role, .. }
            | SamplerError::Affinity { role, .. }
            | SamplerError::ThreadExited { role, .. } => *role,
        }
    }
}

/// Failure to enumerate the active cores.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// A topology file could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// A cpu list was malformed
    #[error("invalid cpu list '{0}'")]
    Parse(String),

    /// No core is both online and usable by this process
    #[error("no active cpus")]
    Empty,
}

/// Errors returned by [`SamplerPool`](crate::SamplerPool).
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// A sampler could not be created; every sampler started by the same
    /// call has been stopped again
    #[error("could not start sampling thread on cpu {cpu}")]
    SamplerStart {
        /// Core on which construction failed
        cpu: u32,
        /// Construction failure
        source: SamplerError,
    },

    /// `start` was called while samplers are still running
    #[error("sampler pool is already running on {0} cpus")]
    AlreadyRunning(usize),

    /// The sampler configuration was rejected
    #[error("invalid sampler configuration: {0}")]
    InvalidConfig(String),

    /// The active cores could not be enumerated
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

impl PoolError {
    /// Core that caused the failure, when one did
    pub fn cpu(&self) -> Option<u32> {
        match self {
            PoolError::SamplerStart { cpu, .. } => Some(*cpu),
            _ => None,
        }
    }
}

/// Sampler construction result
pub type SamplerResult<T = ()> = Result<T, SamplerError>;

/// Pool operation result
pub type PoolResult<T = ()> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_error_accessors() {
        let e = SamplerError::Affinity {
            cpu: 3,
            role: ThreadRole::Timer,
            source: io::Error::from(io::ErrorKind::InvalidInput),
        };
        assert_eq!(e.cpu(), 3);
        assert_eq!(e.role(), ThreadRole::Timer);
        assert!(e.to_string().contains("pin timer thread to cpu 3"));
    }

    #[test]
    fn test_pool_error_cpu() {
        let e = PoolError::SamplerStart {
            cpu: 2,
            source: SamplerError::ThreadExited {
                cpu: 2,
                role: ThreadRole::Worker,
            },
        };
        assert_eq!(e.cpu(), Some(2));
        assert_eq!(e.to_string(), "could not start sampling thread on cpu 2");
        assert_eq!(PoolError::AlreadyRunning(4).cpu(), None);
    }

    #[test]
    fn test_pool_error_source_chain() {
        use std::error::Error;

        let e = PoolError::SamplerStart {
            cpu: 1,
            source: SamplerError::ThreadExited {
                cpu: 1,
                role: ThreadRole::Worker,
            },
        };
        let source = e.source().map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("worker thread for cpu 1 exited during startup")
        );
    }
}

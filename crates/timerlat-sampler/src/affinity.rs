//! Core pinning for sampler threads.
//!
//! A sampler's worker and timer threads are bound to the same core before
//! either reports ready. The binding goes through the [`CoreBinder`] trait so
//! a pool can run unpinned (for platforms without affinity support) or with
//! a custom binder.

use std::io;

#[cfg(target_os = "linux")]
use crate::linux as platform;

#[cfg(not(target_os = "linux"))]
use crate::fallback as platform;

/// Binds the calling thread to a core.
///
/// Called once from inside each newly spawned sampler thread, before the
/// thread reports that it is ready.
pub trait CoreBinder: Send + Sync + 'static {
    /// Restrict the calling thread to `cpu`.
    ///
    /// # Errors
    ///
    /// Returns the OS error when the core does not exist, is offline, or is
    /// outside the process's allowed set.
    fn bind_current_thread(&self, cpu: u32) -> io::Result<()>;

    /// Whether this binder actually restricts threads.
    fn is_pinning(&self) -> bool {
        true
    }
}

/// Pins with `sched_setaffinity` (Linux).
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedAffinity;

impl CoreBinder for SchedAffinity {
    fn bind_current_thread(&self, cpu: u32) -> io::Result<()> {
        platform::pin_current_thread(cpu)
    }
}

/// Leaves threads free to migrate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpinned;

impl CoreBinder for Unpinned {
    fn bind_current_thread(&self, _cpu: u32) -> io::Result<()> {
        Ok(())
    }

    fn is_pinning(&self) -> bool {
        false
    }
}

/// Core the calling thread is running on, where the platform can tell.
pub fn current_cpu() -> Option<u32> {
    platform::current_cpu()
}

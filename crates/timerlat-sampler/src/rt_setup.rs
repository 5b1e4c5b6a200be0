//! Real-time scheduling setup for sampler threads.
//!
//! Raising priority and locking memory improve measurement quality but
//! usually need `CAP_SYS_NICE` / `CAP_IPC_LOCK`. Failures are logged and
//! sampling continues with the default policy.

use crate::error::ThreadRole;

#[cfg(target_os = "linux")]
use crate::linux as platform;

#[cfg(not(target_os = "linux"))]
use crate::fallback as platform;

/// Apply a `SCHED_FIFO` priority to the calling sampler thread.
///
/// Priority 0 leaves the thread on the default policy. Returns whether the
/// priority was applied.
pub(crate) fn apply_thread_priority(cpu: u32, role: ThreadRole, priority: u8) -> bool {
    if priority == 0 {
        return false;
    }

    match platform::set_fifo_priority(priority) {
        Ok(()) => {
            tracing::trace!(cpu, %role, priority, "Applied SCHED_FIFO priority");
            true
        }
        Err(e) => {
            // Non-fatal: may fail without CAP_SYS_NICE
            tracing::debug!(cpu, %role, priority, error = %e, "Could not apply SCHED_FIFO priority");
            false
        }
    }
}

/// Lock process memory if requested. Returns whether memory is locked.
pub(crate) fn apply_memory_lock(enabled: bool) -> bool {
    if !enabled {
        return false;
    }

    match platform::lock_memory() {
        Ok(()) => {
            tracing::debug!("Locked process memory");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not lock process memory, continuing unlocked");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_priority_is_noop() {
        assert!(!apply_thread_priority(0, ThreadRole::Worker, 0));
    }

    #[test]
    fn test_disabled_memory_lock_is_noop() {
        assert!(!apply_memory_lock(false));
    }
}

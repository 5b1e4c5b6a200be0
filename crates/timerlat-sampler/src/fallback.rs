//! Fallback thread placement for platforms without Linux affinity APIs.

use std::io;

fn unsupported(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{what} is not supported on this platform"),
    )
}

/// Thread pinning is unavailable.
pub fn pin_current_thread(_cpu: u32) -> io::Result<()> {
    Err(unsupported("thread pinning"))
}

/// Every logical core is assumed usable.
pub fn allowed_cpus() -> io::Result<Vec<u32>> {
    let count = u32::try_from(num_cpus::get()).unwrap_or(u32::MAX);
    Ok((0..count).collect())
}

/// The executing core cannot be queried.
pub fn current_cpu() -> Option<u32> {
    None
}

/// Real-time scheduling policies are unavailable.
pub fn set_fifo_priority(_priority: u8) -> io::Result<()> {
    Err(unsupported("SCHED_FIFO"))
}

/// Memory locking is unavailable.
pub fn lock_memory() -> io::Result<()> {
    Err(unsupported("mlockall"))
}

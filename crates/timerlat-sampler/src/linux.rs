//! Linux-specific thread placement and scheduling.
#![expect(
    unsafe_code,
    reason = "affinity, scheduling policy and mlockall are only reachable through libc"
)]

use libc::{
    CPU_ISSET, CPU_SET, CPU_SETSIZE, MCL_CURRENT, MCL_FUTURE, SCHED_FIFO, cpu_set_t, mlockall,
    sched_getaffinity, sched_getcpu, sched_param, sched_setaffinity, sched_setscheduler,
};
use std::io;
use std::mem::size_of;

fn empty_cpu_set() -> cpu_set_t {
    // SAFETY: cpu_set_t is a plain bit array; all-zero is the empty set.
    unsafe { std::mem::zeroed() }
}

fn cpu_index(cpu: u32) -> io::Result<usize> {
    let index = usize::try_from(cpu).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    let limit = usize::try_from(CPU_SETSIZE).unwrap_or(0);
    if index >= limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cpu {cpu} is beyond CPU_SETSIZE ({CPU_SETSIZE})"),
        ));
    }
    Ok(index)
}

/// Restrict the calling thread to a single core.
pub fn pin_current_thread(cpu: u32) -> io::Result<()> {
    let index = cpu_index(cpu)?;
    let mut set = empty_cpu_set();

    // SAFETY: index < CPU_SETSIZE, so the bit lies inside `set`.
    unsafe { CPU_SET(index, &mut set) };

    // SAFETY: pid 0 targets the calling thread; `set` is a valid cpu_set_t
    // of the size passed.
    let rc = unsafe { sched_setaffinity(0, size_of::<cpu_set_t>(), &set) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Cores the calling thread is allowed to run on.
pub fn allowed_cpus() -> io::Result<Vec<u32>> {
    let mut set = empty_cpu_set();

    // SAFETY: pid 0 targets the calling thread; `set` is writable and of the
    // size passed.
    let rc = unsafe { sched_getaffinity(0, size_of::<cpu_set_t>(), &mut set) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    let limit = u32::try_from(CPU_SETSIZE).unwrap_or(0);
    let cpus = (0..limit)
        .filter(|&cpu| {
            let Ok(index) = usize::try_from(cpu) else {
                return false;
            };
            // SAFETY: index < CPU_SETSIZE, so the bit lies inside `set`.
            unsafe { CPU_ISSET(index, &set) }
        })
        .collect();
    Ok(cpus)
}

/// Core the calling thread is executing on right now.
pub fn current_cpu() -> Option<u32> {
    // SAFETY: sched_getcpu has no preconditions.
    let cpu = unsafe { sched_getcpu() };
    u32::try_from(cpu).ok()
}

/// Switch the calling thread to `SCHED_FIFO` at the given priority.
///
/// Usually fails without `CAP_SYS_NICE`; callers treat that as non-fatal.
pub fn set_fifo_priority(priority: u8) -> io::Result<()> {
    let param = sched_param {
        sched_priority: i32::from(priority),
    };

    // SAFETY: pid 0 targets the calling thread; `param` outlives the call.
    let rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Lock all current and future pages of the process in memory.
pub fn lock_memory() -> io::Result<()> {
    // SAFETY: mlockall has no memory-safety preconditions.
    let rc = unsafe { mlockall(MCL_CURRENT | MCL_FUTURE) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

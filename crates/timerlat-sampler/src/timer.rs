//! Pinned one-shot absolute-deadline timer.
//!
//! Each timer owns a dedicated thread bound to the sampler's core. That
//! thread stands in for interrupt context: it runs at a higher real-time
//! priority than the worker when permitted, sleeps until the armed deadline,
//! and runs the callback once per arm. The timer never re-arms itself.

use crate::affinity::CoreBinder;
use crate::clock::MonotonicClock;
use crate::error::{SamplerError, SamplerResult, ThreadRole};
use crate::rt_setup::apply_thread_priority;
use crossbeam::channel;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Timestamps handed to the callback when the timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFire {
    /// Deadline the timer was armed for
    pub deadline_ns: u64,
    /// Clock reading when expiry was observed
    pub now_ns: u64,
}

impl TimerFire {
    /// Delay between the deadline and the fire, zero if early.
    #[inline]
    pub fn latency_ns(&self) -> u64 {
        self.now_ns.saturating_sub(self.deadline_ns)
    }
}

#[derive(Debug, Default)]
struct TimerState {
    armed: Option<u64>,
    in_callback: bool,
    shutdown: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<TimerState>,
    cond: Condvar,
}

/// One-shot timer whose callback runs on a thread pinned to `cpu`.
pub struct PinnedTimer {
    cpu: u32,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl PinnedTimer {
    /// Spawn the timer thread, pin it, and wait until it is ready.
    ///
    /// # Errors
    ///
    /// Fails when the thread cannot be spawned or pinned. No thread is left
    /// running on failure.
    pub fn spawn<F>(
        cpu: u32,
        clock: MonotonicClock,
        binder: Arc<dyn CoreBinder>,
        priority: u8,
        callback: F,
    ) -> SamplerResult<Self>
    where
        F: FnMut(TimerFire) + Send + 'static,
    {
        let shared = Arc::new(Shared::default());
        let (ready_tx, ready_rx) = channel::bounded::<io::Result<()>>(1);

        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(format!("timerlat-irq/{cpu}"))
            .spawn(move || {
                if let Err(e) = binder.bind_current_thread(cpu) {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
                apply_thread_priority(cpu, ThreadRole::Timer, priority);
                let _ = ready_tx.send(Ok(()));
                drop(ready_tx);

                run_timer_loop(cpu, &thread_shared, clock, callback);
            })
            .map_err(|source| SamplerError::Spawn {
                cpu,
                role: ThreadRole::Timer,
                source,
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                cpu,
                shared,
                thread: Some(handle),
            }),
            Ok(Err(source)) => {
                let _ = handle.join();
                Err(SamplerError::Affinity {
                    cpu,
                    role: ThreadRole::Timer,
                    source,
                })
            }
            Err(_) => {
                let _ = handle.join();
                Err(SamplerError::ThreadExited {
                    cpu,
                    role: ThreadRole::Timer,
                })
            }
        }
    }

    /// Core this timer is pinned to
    pub fn cpu(&self) -> u32 {
        self.cpu
    }

    /// Arm for an absolute deadline, replacing any pending one.
    ///
    /// A deadline already in the past fires immediately.
    pub fn arm(&self, deadline_ns: u64) {
        let mut state = self.shared.state.lock();
        state.armed = Some(deadline_ns);
        self.shared.cond.notify_all();
    }

    /// Whether a deadline is pending
    pub fn is_armed(&self) -> bool {
        self.shared.state.lock().armed.is_some()
    }

    /// Disarm, then wait for any callback already running to return.
    ///
    /// After `cancel` returns the callback will not run again until the
    /// next [`arm`](Self::arm). Must not be called from the callback.
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock();
        state.armed = None;
        self.shared.cond.notify_all();
        while state.in_callback {
            self.shared.cond.wait(&mut state);
        }
    }

    fn shutdown(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.armed = None;
            state.shutdown = true;
            self.shared.cond.notify_all();
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                tracing::error!(cpu = self.cpu, "Timer thread panicked");
            }
        }
    }
}

impl Drop for PinnedTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PinnedTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinnedTimer")
            .field("cpu", &self.cpu)
            .field("running", &self.thread.is_some())
            .finish()
    }
}

fn run_timer_loop<F>(cpu: u32, shared: &Shared, clock: MonotonicClock, mut callback: F)
where
    F: FnMut(TimerFire),
{
    let mut state = shared.state.lock();
    while !state.shutdown {
        let Some(deadline_ns) = state.armed else {
            shared.cond.wait(&mut state);
            continue;
        };

        let now_ns = clock.now_ns();
        if now_ns < deadline_ns {
            let _ = shared
                .cond
                .wait_until(&mut state, clock.instant_at(deadline_ns));
            continue;
        }

        state.armed = None;
        state.in_callback = true;
        let fire = TimerFire {
            deadline_ns,
            now_ns,
        };
        let outcome = MutexGuard::unlocked(&mut state, || {
            panic::catch_unwind(AssertUnwindSafe(|| callback(fire)))
        });
        state.in_callback = false;
        shared.cond.notify_all();

        if outcome.is_err() {
            tracing::error!(cpu, "Timer callback panicked, timer disabled");
            state.shutdown = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::Unpinned;
    use crossbeam::channel::RecvTimeoutError;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;

    fn unpinned() -> Arc<dyn CoreBinder> {
        Arc::new(Unpinned)
    }

    #[test]
    fn test_fires_once_after_deadline() -> SamplerResult {
        let clock = MonotonicClock::new();
        let (tx, rx) = channel::unbounded();
        let timer = PinnedTimer::spawn(0, clock, unpinned(), 0, move |fire| {
            let _ = tx.send(fire);
        })?;

        let deadline = clock.now_ns() + 2_000_000;
        timer.arm(deadline);

        let fire = rx.recv_timeout(Duration::from_secs(5));
        assert!(fire.is_ok());
        if let Ok(fire) = fire {
            assert_eq!(fire.deadline_ns, deadline);
            assert!(fire.now_ns >= deadline);
        }

        // One-shot: no second fire without a re-arm
        assert_eq!(
            rx.recv_timeout(Duration::from_millis(20)),
            Err(RecvTimeoutError::Timeout)
        );
        assert!(!timer.is_armed());
        Ok(())
    }

    #[test]
    fn test_past_deadline_fires_immediately() -> SamplerResult {
        let clock = MonotonicClock::new();
        let (tx, rx) = channel::unbounded();
        let timer = PinnedTimer::spawn(0, clock, unpinned(), 0, move |fire: TimerFire| {
            let _ = tx.send(fire.latency_ns());
        })?;

        std::thread::sleep(Duration::from_millis(2));
        timer.arm(0);

        let latency = rx.recv_timeout(Duration::from_secs(5));
        assert!(matches!(latency, Ok(l) if l > 0));
        Ok(())
    }

    #[test]
    fn test_cancel_prevents_fire() -> SamplerResult {
        let clock = MonotonicClock::new();
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let timer = PinnedTimer::spawn(0, clock, unpinned(), 0, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })?;

        timer.arm(clock.now_ns() + 50_000_000);
        timer.cancel();
        std::thread::sleep(Duration::from_millis(80));

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn test_cancel_waits_for_running_callback() -> SamplerResult {
        let clock = MonotonicClock::new();
        let (entered_tx, entered_rx) = channel::bounded(1);
        let finished = Arc::new(AtomicBool::new(false));
        let done = Arc::clone(&finished);

        let timer = PinnedTimer::spawn(0, clock, unpinned(), 0, move |_| {
            let _ = entered_tx.send(());
            std::thread::sleep(Duration::from_millis(50));
            done.store(true, Ordering::SeqCst);
        })?;

        timer.arm(clock.now_ns());
        assert!(entered_rx.recv_timeout(Duration::from_secs(5)).is_ok());

        timer.cancel();
        assert!(finished.load(Ordering::SeqCst));
        Ok(())
    }

    #[test]
    fn test_failed_pin_reports_affinity_error() {
        struct Refuse;
        impl CoreBinder for Refuse {
            fn bind_current_thread(&self, _cpu: u32) -> io::Result<()> {
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            }
        }

        let result = PinnedTimer::spawn(7, MonotonicClock::new(), Arc::new(Refuse), 0, |_| {});
        assert!(matches!(
            result,
            Err(SamplerError::Affinity {
                cpu: 7,
                role: ThreadRole::Timer,
                ..
            })
        ));
    }

    #[test]
    fn test_panicking_callback_does_not_hang_cancel() -> SamplerResult {
        let clock = MonotonicClock::new();
        let timer = PinnedTimer::spawn(0, clock, unpinned(), 0, |_| {
            panic::resume_unwind(Box::new("callback failure"))
        })?;
        timer.arm(clock.now_ns());
        std::thread::sleep(Duration::from_millis(20));
        timer.cancel();
        Ok(())
    }
}

//! Per-core sampler: a pinned worker driving a pinned one-shot timer.
//!
//! The worker arms the timer for an absolute deadline and parks. The timer
//! thread measures how late it woke, classifies and emits the sample,
//! updates the shared maximum, and wakes the worker. The worker then steps
//! the deadline by exactly one period and repeats until asked to stop.

use crate::affinity::{CoreBinder, SchedAffinity, Unpinned};
use crate::clock::MonotonicClock;
use crate::config::{RuntimeConfig, SamplerConfig};
use crate::error::{SamplerError, SamplerResult, ThreadRole};
use crate::handoff::{Handoff, Wake};
use crate::rt_setup::apply_thread_priority;
use crate::timer::{PinnedTimer, TimerFire};
use crossbeam::channel;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use timerlat_atomic::MaxLatencyTracker;
use timerlat_tracing::{LatencyEvent, TracingManager};

/// State shared by every sampler in a pool.
///
/// Cloning is cheap; all fields are reference counted.
#[derive(Debug, Clone)]
pub struct SamplerContext {
    /// Highest latency seen on any core
    pub tracker: Arc<MaxLatencyTracker>,
    /// Operator-tunable knobs
    pub runtime: Arc<RuntimeConfig>,
    /// Event sink
    pub tracing: Arc<TracingManager>,
}

impl SamplerContext {
    pub fn new(
        tracker: Arc<MaxLatencyTracker>,
        runtime: Arc<RuntimeConfig>,
        tracing: Arc<TracingManager>,
    ) -> Self {
        Self {
            tracker,
            runtime,
            tracing,
        }
    }

    /// Classify one measured latency, emit it, and fold it into the
    /// maximum. Called from the timer context once per fire.
    pub fn record_latency(&self, cpu: u32, latency_ns: u64) -> LatencyEvent {
        let event = LatencyEvent::classify(cpu, latency_ns, self.runtime.threshold_ns());
        self.tracing.emit_rt_event(event);
        self.tracker.update(latency_ns);
        event
    }
}

/// Absolute deadlines on a fixed grid.
///
/// The first deadline is one period after the start time; every later one
/// is exactly one period after the previous, regardless of how late the
/// previous fire was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineSchedule {
    period_ns: u64,
    next_deadline_ns: u64,
    cycles: u64,
}

impl DeadlineSchedule {
    /// Schedule whose first deadline is `now_ns + period_ns`.
    pub fn start(now_ns: u64, period_ns: u64) -> Self {
        Self {
            period_ns,
            next_deadline_ns: now_ns.saturating_add(period_ns),
            cycles: 0,
        }
    }

    /// Deadline to arm next
    #[inline]
    pub fn deadline(&self) -> u64 {
        self.next_deadline_ns
    }

    /// Step to the following deadline and return it.
    #[inline]
    pub fn advance(&mut self) -> u64 {
        self.next_deadline_ns = self.next_deadline_ns.saturating_add(self.period_ns);
        self.cycles = self.cycles.saturating_add(1);
        self.next_deadline_ns
    }

    /// Completed cycles
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }
}

/// Callback run in the timer context after each fire has been recorded.
pub type FireObserver = Arc<dyn Fn(u32, TimerFire) + Send + Sync>;

/// Creates samplers that share one context, configuration, and clock.
#[derive(Clone)]
pub struct SamplerFactory {
    ctx: SamplerContext,
    config: SamplerConfig,
    clock: MonotonicClock,
    binder: Arc<dyn CoreBinder>,
    observer: Option<FireObserver>,
}

impl SamplerFactory {
    /// Factory pinning with the platform binder unless pinning is disabled
    /// or unsupported.
    pub fn new(ctx: SamplerContext, config: SamplerConfig) -> Self {
        let binder: Arc<dyn CoreBinder> = if config.pin_threads && cfg!(target_os = "linux") {
            Arc::new(SchedAffinity)
        } else {
            Arc::new(Unpinned)
        };
        Self {
            ctx,
            config,
            clock: MonotonicClock::new(),
            binder,
            observer: None,
        }
    }

    /// Replace the core binder.
    pub fn with_binder(mut self, binder: Arc<dyn CoreBinder>) -> Self {
        self.binder = binder;
        self
    }

    /// Observe every timer fire of samplers spawned from now on.
    ///
    /// The observer runs on the timer thread, after the sample is emitted
    /// and before the worker is woken, so it must stay short.
    pub fn with_fire_observer(mut self, observer: FireObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn context(&self) -> &SamplerContext {
        &self.ctx
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn clock(&self) -> MonotonicClock {
        self.clock
    }

    /// Start a sampler on `cpu`.
    ///
    /// Returns once the worker and its timer are both pinned and the first
    /// deadline is about to be armed.
    ///
    /// # Errors
    ///
    /// Fails when either thread cannot be spawned or pinned. Nothing is left
    /// running on failure.
    pub fn spawn(&self, cpu: u32) -> SamplerResult<Sampler> {
        let handoff = Arc::new(Handoff::new());
        let running = Arc::new(AtomicBool::new(true));
        let cycles = Arc::new(AtomicU64::new(0));
        let (ready_tx, ready_rx) = channel::bounded::<SamplerResult>(1);

        let worker = Worker {
            cpu,
            factory: self.clone(),
            handoff: Arc::clone(&handoff),
            running: Arc::clone(&running),
            cycles: Arc::clone(&cycles),
        };

        let handle = thread::Builder::new()
            .name(format!("timerlat/{cpu}"))
            .spawn(move || worker.run(ready_tx))
            .map_err(|source| SamplerError::Spawn {
                cpu,
                role: ThreadRole::Worker,
                source,
            })?;

        let ready = ready_rx.recv().unwrap_or(Err(SamplerError::ThreadExited {
            cpu,
            role: ThreadRole::Worker,
        }));

        match ready {
            Ok(()) => {
                tracing::trace!(cpu, "Sampler worker ready");
                Ok(Sampler {
                    cpu,
                    handoff,
                    running,
                    cycles,
                    worker: Some(handle),
                })
            }
            Err(e) => {
                let _ = handle.join();
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for SamplerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplerFactory")
            .field("config", &self.config)
            .field("pinning", &self.binder.is_pinning())
            .field("observed", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

struct Worker {
    cpu: u32,
    factory: SamplerFactory,
    handoff: Arc<Handoff>,
    running: Arc<AtomicBool>,
    cycles: Arc<AtomicU64>,
}

impl Worker {
    fn run(self, ready_tx: channel::Sender<SamplerResult>) {
        let cpu = self.cpu;
        let factory = &self.factory;

        if let Err(source) = factory.binder.bind_current_thread(cpu) {
            self.running.store(false, Ordering::Release);
            let _ = ready_tx.send(Err(SamplerError::Affinity {
                cpu,
                role: ThreadRole::Worker,
                source,
            }));
            return;
        }
        apply_thread_priority(cpu, ThreadRole::Worker, factory.config.worker_priority);

        let timer = {
            let ctx = factory.ctx.clone();
            let handoff = Arc::clone(&self.handoff);
            let observer = factory.observer.clone();
            PinnedTimer::spawn(
                cpu,
                factory.clock,
                Arc::clone(&factory.binder),
                factory.config.timer_priority,
                move |fire: TimerFire| {
                    ctx.record_latency(cpu, fire.latency_ns());
                    if let Some(observer) = observer.as_deref() {
                        observer(cpu, fire);
                    }
                    handoff.fire();
                },
            )
        };

        let timer = match timer {
            Ok(timer) => timer,
            Err(e) => {
                self.running.store(false, Ordering::Release);
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        let _ = ready_tx.send(Ok(()));
        drop(ready_tx);

        let mut schedule =
            DeadlineSchedule::start(factory.clock.now_ns(), factory.config.period_ns());
        loop {
            timer.arm(schedule.deadline());
            match self.handoff.park() {
                Wake::Fired => {
                    schedule.advance();
                    self.cycles.store(schedule.cycles(), Ordering::Relaxed);
                }
                Wake::Stop => break,
            }
        }

        timer.cancel();
        drop(timer);
        self.running.store(false, Ordering::Release);
        tracing::trace!(cpu, cycles = schedule.cycles(), "Sampler worker exiting");
    }
}

/// A running sampler on one core.
///
/// Dropping a sampler stops it.
#[derive(Debug)]
pub struct Sampler {
    cpu: u32,
    handoff: Arc<Handoff>,
    running: Arc<AtomicBool>,
    cycles: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl Sampler {
    /// Core this sampler is pinned to
    pub fn cpu(&self) -> u32 {
        self.cpu
    }

    /// Whether the worker is still looping
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Completed sampling cycles
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Ask the worker to exit without waiting for it.
    pub fn request_stop(&self) {
        self.handoff.request_stop();
    }

    /// Stop the worker and wait until it and its timer are gone.
    ///
    /// After this returns no callback of this sampler runs again.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        self.handoff.request_stop();
        if handle.join().is_err() {
            tracing::error!(cpu = self.cpu, "Sampler worker panicked");
        }
        self.running.store(false, Ordering::Release);
        tracing::trace!(cpu = self.cpu, "Sampler worker joined");
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

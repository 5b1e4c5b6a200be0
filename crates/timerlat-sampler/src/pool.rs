//! One sampler per active core, started and stopped as a unit.

use crate::affinity::CoreBinder;
use crate::config::SamplerConfig;
use crate::error::{PoolError, PoolResult};
use crate::rt_setup::apply_memory_lock;
use crate::sampler::{Sampler, SamplerContext, SamplerFactory};
use crate::topology::{CpuTopology, SystemTopology};
use std::collections::BTreeMap;
use std::sync::Arc;
use timerlat_tracing::LifecycleEvent;

/// Samplers keyed by core.
///
/// `start` either brings up a sampler on every active core or leaves none
/// running. `stop` always succeeds and can be called any number of times.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use timerlat_atomic::MaxLatencyTracker;
/// use timerlat_sampler::{RuntimeConfig, SamplerConfig, SamplerContext, SamplerPool};
/// use timerlat_tracing::{SinkKind, TracingManager};
///
/// let ctx = SamplerContext::new(
///     Arc::new(MaxLatencyTracker::new()),
///     Arc::new(RuntimeConfig::default()),
///     Arc::new(TracingManager::for_sink(SinkKind::Auto)?),
/// );
/// let mut pool = SamplerPool::new(ctx.clone(), SamplerConfig::default());
///
/// pool.start()?;
/// std::thread::sleep(std::time::Duration::from_secs(1));
/// pool.stop();
///
/// println!("max latency: {} ns", ctx.tracker.snapshot());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SamplerPool {
    factory: SamplerFactory,
    topology: Arc<dyn CpuTopology>,
    samplers: BTreeMap<u32, Sampler>,
}

impl SamplerPool {
    /// Pool over the system's online cores.
    pub fn new(ctx: SamplerContext, config: SamplerConfig) -> Self {
        Self {
            factory: SamplerFactory::new(ctx, config),
            topology: Arc::new(SystemTopology::new()),
            samplers: BTreeMap::new(),
        }
    }

    /// Replace the source of active cores.
    pub fn with_topology(mut self, topology: Arc<dyn CpuTopology>) -> Self {
        self.topology = topology;
        self
    }

    /// Replace the core binder used by every sampler.
    pub fn with_binder(mut self, binder: Arc<dyn CoreBinder>) -> Self {
        self.factory = self.factory.clone().with_binder(binder);
        self
    }

    /// Shared sampler state
    pub fn context(&self) -> &SamplerContext {
        self.factory.context()
    }

    /// Start one sampler per active core.
    ///
    /// The topology stays locked against changes until every sampler is up
    /// or the rollback has finished.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidConfig`] if the configuration is rejected
    /// - [`PoolError::AlreadyRunning`] if samplers from an earlier start
    ///   are still active
    /// - [`PoolError::Topology`] if the active cores cannot be enumerated
    /// - [`PoolError::SamplerStart`] naming the first core whose sampler
    ///   could not be created; samplers created before it are stopped in
    ///   reverse order
    pub fn start(&mut self) -> PoolResult {
        let config = self.factory.config();
        config.validate().map_err(PoolError::InvalidConfig)?;

        if !self.samplers.is_empty() {
            return Err(PoolError::AlreadyRunning(self.samplers.len()));
        }

        apply_memory_lock(config.lock_memory);

        if self.context().runtime.stop_on_exceeded() {
            tracing::info!("stop_on_exceeded is set but sampling does not stop on threshold violations");
        }

        let topology = Arc::clone(&self.topology);
        let snapshot = topology.snapshot()?;
        let events = Arc::clone(&self.context().tracing);

        let mut started: Vec<Sampler> = Vec::with_capacity(snapshot.len());
        for &cpu in snapshot.cpus() {
            match self.factory.spawn(cpu) {
                Ok(sampler) => {
                    events.emit_app_event(LifecycleEvent::SamplerStarted { cpu });
                    started.push(sampler);
                }
                Err(source) => {
                    events.emit_app_event(LifecycleEvent::SamplerStartFailed {
                        cpu,
                        reason: source.to_string(),
                    });
                    while let Some(sampler) = started.pop() {
                        let stopped = sampler.cpu();
                        sampler.stop();
                        events.emit_app_event(LifecycleEvent::SamplerStopped { cpu: stopped });
                    }
                    return Err(PoolError::SamplerStart { cpu, source });
                }
            }
        }
        drop(snapshot);

        self.samplers = started
            .into_iter()
            .map(|sampler| (sampler.cpu(), sampler))
            .collect();

        tracing::info!(cpus = self.samplers.len(), "Sampling started");
        Ok(())
    }

    /// Stop every sampler and wait for each to finish.
    ///
    /// The topology stays locked against changes until every entry is
    /// removed. Once this returns no sampler from this pool emits events or
    /// touches the tracker.
    pub fn stop(&mut self) {
        if self.samplers.is_empty() {
            return;
        }

        let topology = Arc::clone(&self.topology);
        let hotplug = topology.hotplug_guard();
        let events = Arc::clone(&self.context().tracing);
        let count = self.samplers.len();
        for sampler in self.samplers.values() {
            sampler.request_stop();
        }
        while let Some((cpu, sampler)) = self.samplers.pop_first() {
            sampler.stop();
            events.emit_app_event(LifecycleEvent::SamplerStopped { cpu });
        }
        drop(hotplug);
        tracing::info!(cpus = count, "Sampling stopped");
    }

    /// Number of running samplers
    pub fn len(&self) -> usize {
        self.samplers.len()
    }

    /// Whether no sampler is running
    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty()
    }

    /// Whether samplers are running
    pub fn is_running(&self) -> bool {
        !self.samplers.is_empty()
    }

    /// Cores with a running sampler, ascending
    pub fn cpus(&self) -> Vec<u32> {
        self.samplers.keys().copied().collect()
    }

    /// Sampler on `cpu`, if one is running
    pub fn sampler(&self, cpu: u32) -> Option<&Sampler> {
        self.samplers.get(&cpu)
    }
}

impl Drop for SamplerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SamplerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplerPool")
            .field("factory", &self.factory)
            .field("cpus", &self.cpus())
            .finish()
    }
}

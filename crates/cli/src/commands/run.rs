//! `run`: sample every active core until a duration elapses or Ctrl-C

use anyhow::Result;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use timerlat_atomic::MaxLatencyTracker;
use timerlat_sampler::{RuntimeConfig, SamplerContext, SamplerPool};
use timerlat_tracing::{LifecycleEvent, TracingManager};

use crate::commands::RunArgs;
use crate::error::CliError;
use crate::output;
use crate::settings::Settings;

/// Why sampling ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    DurationElapsed,
    Interrupted,
}

/// Summary printed after a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub cpus: Vec<u32>,
    pub period_us: u64,
    pub elapsed_ms: u64,
    pub stop_reason: StopReason,
    pub max_latency_ns: u64,
    pub latency_threshold_us: i64,
    pub stop_on_exceeded: bool,
    pub sink: String,
    pub samples: u64,
    pub exceeded: u64,
    pub dropped: u64,
}

/// Execute `run`
pub async fn execute(args: &RunArgs, json: bool) -> Result<()> {
    let settings = Settings::resolve(args)?;
    let sink = settings.sink_kind()?;

    let events = Arc::new(TracingManager::for_sink(sink).map_err(CliError::from)?);
    let tracker = Arc::new(MaxLatencyTracker::new());
    let runtime = Arc::new(RuntimeConfig::new(settings.runtime));
    let ctx = SamplerContext::new(Arc::clone(&tracker), Arc::clone(&runtime), Arc::clone(&events));

    tracing::info!(
        period_us = settings.sampler.period_us,
        threshold_us = runtime.latency_threshold_us(),
        sink = %sink,
        "Starting latency sampling"
    );

    let mut pool = SamplerPool::new(ctx, settings.sampler.clone());
    let pool = tokio::task::spawn_blocking(move || pool.start().map(|()| pool))
        .await?
        .map_err(CliError::from)?;
    let cpus = pool.cpus();

    let started = Instant::now();
    let stop = wait_for_stop(
        settings.duration_ms.map(Duration::from_millis),
        tokio::signal::ctrl_c(),
    );
    let (waited, max_latency_ns) = sample_until(pool, &tracker, &events, stop).await;
    let elapsed = started.elapsed();
    let stop_reason = waited?;

    let metrics = events.metrics();
    let report = RunReport {
        cpus,
        period_us: settings.sampler.period_us,
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        stop_reason,
        max_latency_ns,
        latency_threshold_us: runtime.latency_threshold_us(),
        stop_on_exceeded: runtime.stop_on_exceeded(),
        sink: sink.to_string(),
        samples: metrics.rt_events_emitted,
        exceeded: metrics.exceeded_events,
        dropped: metrics.events_dropped,
    };

    if let Ok(mut manager) = Arc::try_unwrap(events) {
        manager.shutdown();
    }

    output::print_run_report(&report, json)
}

/// Let the pool sample until `stop` resolves, then stop it and report the
/// maximum latency. The pool is stopped and the maximum reported even when
/// `stop` fails; its result is handed back with the maximum.
async fn sample_until<F>(
    pool: SamplerPool,
    tracker: &MaxLatencyTracker,
    events: &TracingManager,
    stop: F,
) -> (Result<StopReason>, u64)
where
    F: Future<Output = Result<StopReason>>,
{
    let waited = stop.await;
    if let Err(e) = &waited {
        tracing::error!(error = %e, "Waiting for stop failed, stopping samplers");
    }

    if let Err(e) = tokio::task::spawn_blocking(move || drop(pool)).await {
        tracing::error!(error = %e, "Sampler shutdown task failed");
    }

    let max_latency_ns = tracker.snapshot();
    events.emit_app_event(LifecycleEvent::SamplingFinished { max_latency_ns });
    (waited, max_latency_ns)
}

async fn wait_for_stop<S>(duration: Option<Duration>, interrupt: S) -> Result<StopReason>
where
    S: Future<Output = std::io::Result<()>>,
{
    match duration {
        Some(duration) => {
            tokio::select! {
                _ = tokio::time::sleep(duration) => Ok(StopReason::DurationElapsed),
                signal = interrupt => {
                    signal?;
                    Ok(StopReason::Interrupted)
                }
            }
        }
        None => {
            interrupt.await?;
            Ok(StopReason::Interrupted)
        }
    }
}

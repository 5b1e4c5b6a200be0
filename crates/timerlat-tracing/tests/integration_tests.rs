//! Integration tests for latency event emission.

use std::sync::Arc;
use std::thread;

use timerlat_tracing::{
    LatencyEvent, LifecycleEvent, SinkKind, TracingError, TracingManager, TracingProvider,
};

#[cfg(target_os = "linux")]
#[test]
fn test_trace_marker_writes_one_line_per_event() -> Result<(), Box<dyn std::error::Error>> {
    use timerlat_tracing::platform::TraceMarkerProvider;

    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("trace_marker");
    std::fs::write(&marker, "")?;

    let mut provider = TraceMarkerProvider::with_path(&marker);
    provider.initialize()?;
    assert!(provider.is_enabled());

    provider.emit_rt_event(LatencyEvent::Sample {
        cpu: 0,
        latency_ns: 3_100,
    });
    provider.emit_rt_event(LatencyEvent::Exceeded {
        cpu: 5,
        latency_ns: 120_000,
        threshold_ns: 100_000,
    });
    provider.shutdown();

    let contents = std::fs::read_to_string(&marker)?;
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "timerlat: tracing initialized",
            "timerlat_sample cpu=0 latency_ns=3100",
            "timerlat_exceeded cpu=5 latency_ns=120000 threshold_ns=100000",
            "timerlat: tracing shutdown",
        ]
    );
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn test_trace_marker_concurrent_emitters_lose_nothing() -> Result<(), Box<dyn std::error::Error>> {
    use timerlat_tracing::platform::TraceMarkerProvider;

    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("trace_marker");
    std::fs::write(&marker, "")?;

    let mut provider = TraceMarkerProvider::with_path(&marker);
    provider.initialize()?;
    let provider = Arc::new(provider);

    const CORES: u32 = 8;
    const PER_CORE: u64 = 2_000;

    // Released together so every emitter contends for the marker at once
    let barrier = Arc::new(std::sync::Barrier::new(CORES as usize));
    let handles: Vec<_> = (0..CORES)
        .map(|cpu| {
            let provider = Arc::clone(&provider);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_CORE {
                    provider.emit_rt_event(LatencyEvent::Sample {
                        cpu,
                        latency_ns: i,
                    });
                }
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().is_ok(), "emitter panicked unexpectedly");
    }

    let total = u64::from(CORES) * PER_CORE;
    let metrics = provider.metrics();
    assert_eq!(metrics.events_dropped, 0);
    assert_eq!(metrics.rt_events_emitted, total);

    let contents = std::fs::read_to_string(&marker)?;
    let written = contents
        .lines()
        .filter(|line| line.starts_with("timerlat_sample cpu="))
        .count() as u64;
    assert_eq!(written, total);
    Ok(())
}

#[test]
fn test_manager_shared_across_threads() -> Result<(), TracingError> {
    let manager = Arc::new(TracingManager::for_sink(SinkKind::Null)?);

    let handles: Vec<_> = (0..8u32)
        .map(|cpu| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for latency_ns in 0..100u64 {
                    manager.emit_rt_event(LatencyEvent::classify(cpu, latency_ns, Some(89)));
                }
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().is_ok(), "emitter panicked unexpectedly");
    }

    let metrics = manager.metrics();
    assert_eq!(metrics.rt_events_emitted, 800);
    assert_eq!(metrics.exceeded_events, 8 * 10);
    Ok(())
}

#[test]
fn test_log_sink_under_subscriber() -> Result<(), TracingError> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let manager = TracingManager::for_sink(SinkKind::Log)?;
        manager.emit_rt_event(LatencyEvent::Sample {
            cpu: 0,
            latency_ns: 10,
        });
        manager.emit_app_event(LifecycleEvent::SamplingFinished { max_latency_ns: 10 });

        let metrics = manager.metrics();
        assert_eq!(metrics.rt_events_emitted, 1);
        assert_eq!(metrics.app_events_emitted, 1);
        Ok(())
    })
}

#[cfg(not(target_os = "linux"))]
#[test]
fn test_trace_marker_unsupported_off_linux() {
    assert!(matches!(
        TracingManager::for_sink(SinkKind::TraceMarker),
        Err(TracingError::PlatformNotSupported(_))
    ));
}

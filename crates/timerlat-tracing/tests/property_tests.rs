//! Property-based tests for latency event classification.

use proptest::prelude::*;
use timerlat_tracing::LatencyEvent;

proptest! {
    #[test]
    fn prop_no_threshold_never_exceeds(cpu in any::<u32>(), latency_ns in any::<u64>()) {
        let event = LatencyEvent::classify(cpu, latency_ns, None);
        prop_assert!(!event.is_exceeded());
        prop_assert_eq!(event.latency_ns(), latency_ns);
        prop_assert_eq!(event.cpu(), cpu);
    }

    #[test]
    fn prop_exceeded_iff_strictly_above(latency_ns in any::<u64>(), threshold_ns in any::<u64>()) {
        let event = LatencyEvent::classify(0, latency_ns, Some(threshold_ns));
        prop_assert_eq!(event.is_exceeded(), latency_ns > threshold_ns);
    }

    #[test]
    fn prop_display_starts_with_event_type(latency_ns in any::<u64>(), threshold_ns in any::<u64>()) {
        let event = LatencyEvent::classify(1, latency_ns, Some(threshold_ns));
        let line = event.to_string();
        prop_assert!(line.starts_with(event.event_type()));
        let expected_latency = format!("latency_ns={latency_ns}");
        prop_assert!(line.contains(&expected_latency));
    }
}

//! Property-based tests for timerlat-atomic.

use proptest::prelude::*;
use quickcheck_macros::quickcheck;
use timerlat_atomic::{MaxLatencyTracker, UpdateOutcome};

#[quickcheck]
fn prop_final_snapshot_is_maximum(values: Vec<u64>) -> bool {
    let tracker = MaxLatencyTracker::new();

    for &value in &values {
        tracker.update(value);
    }

    tracker.snapshot() == values.iter().copied().max().unwrap_or(0)
}

#[quickcheck]
fn prop_snapshot_never_decreases(values: Vec<u64>) -> bool {
    let tracker = MaxLatencyTracker::new();
    let mut last = tracker.snapshot();

    values.iter().all(|&value| {
        tracker.update(value);
        let now = tracker.snapshot();
        let ok = now >= last;
        last = now;
        ok
    })
}

#[quickcheck]
fn prop_outcome_matches_comparison(initial: u64, latency: u64) -> bool {
    let tracker = MaxLatencyTracker::with_value(initial);

    match tracker.update(latency) {
        UpdateOutcome::Raised { previous } => latency > initial && previous == initial,
        UpdateOutcome::Unchanged { current } => latency <= initial && current == initial,
    }
}

proptest! {
    #[test]
    fn prop_order_of_updates_does_not_matter(mut values in prop::collection::vec(any::<u64>(), 0..200)) {
        let forward = MaxLatencyTracker::new();
        for &value in &values {
            forward.update(value);
        }

        values.reverse();
        let backward = MaxLatencyTracker::new();
        for &value in &values {
            backward.update(value);
        }

        prop_assert_eq!(forward.snapshot(), backward.snapshot());
    }
}

//! Park/wake handoff between a timer callback and its worker.

use parking_lot::{Condvar, Mutex};

/// Why a parked worker woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The timer fired for the armed deadline
    Fired,
    /// The worker was asked to exit
    Stop,
}

#[derive(Debug, Default)]
struct State {
    fired: bool,
    stop_requested: bool,
}

/// One-slot wake signal.
///
/// A fire that arrives before the worker parks is not lost: the next
/// [`park`](Self::park) returns immediately. A stop request wins over a
/// pending fire and stays set.
#[derive(Debug, Default)]
pub struct Handoff {
    state: Mutex<State>,
    cond: Condvar,
}

impl Handoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake the worker for a timer fire.
    pub fn fire(&self) {
        self.state.lock().fired = true;
        self.cond.notify_one();
    }

    /// Ask the worker to exit at its next wake.
    pub fn request_stop(&self) {
        self.state.lock().stop_requested = true;
        self.cond.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.state.lock().stop_requested
    }

    /// Block until fired or asked to stop, consuming a pending fire.
    pub fn park(&self) -> Wake {
        let mut state = self.state.lock();
        loop {
            if state.stop_requested {
                return Wake::Stop;
            }
            if state.fired {
                state.fired = false;
                return Wake::Fired;
            }
            self.cond.wait(&mut state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fire_before_park_is_kept() {
        let handoff = Handoff::new();
        handoff.fire();
        assert_eq!(handoff.park(), Wake::Fired);
    }

    #[test]
    fn test_stop_wins_over_pending_fire() {
        let handoff = Handoff::new();
        handoff.fire();
        handoff.request_stop();
        assert_eq!(handoff.park(), Wake::Stop);
        assert_eq!(handoff.park(), Wake::Stop);
        assert!(handoff.is_stop_requested());
    }

    #[test]
    fn test_cross_thread_wake() {
        let handoff = Arc::new(Handoff::new());
        let worker = {
            let handoff = Arc::clone(&handoff);
            thread::spawn(move || {
                let mut fires = 0u32;
                while handoff.park() == Wake::Fired {
                    fires += 1;
                }
                fires
            })
        };

        handoff.fire();
        handoff.request_stop();

        let fires = worker.join().unwrap_or(u32::MAX);
        assert!(fires <= 1);
    }
}

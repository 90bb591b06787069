//! Multi-threaded mining simulation
//!
//! Miner threads race to extend one shared ledger while a background thread
//! submits client payments at a fixed pace. The coordinator waits for the target
//! height, stops everything and saves progress.

pub mod client;
pub mod miner;
pub mod participants;
pub mod simulator;

pub use client::ClientActivity;
pub use miner::Miner;
pub use participants::{Participant, Participants};
pub use simulator::{SimulationEvent, SimulationReport, Simulator};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// Longest single sleep of a background thread before it looks at the flag again
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Thread-safe flag used to signal worker threads to shut down.
///
/// Once triggered the flag remains set.
#[derive(Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early if the flag is set. Returns whether
    /// shutdown was requested.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_triggered() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep((deadline - now).min(SHUTDOWN_POLL_INTERVAL));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_flag_is_shared() {
        let flag = ShutdownFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_triggered());
        flag.trigger();
        assert!(clone.is_triggered());
    }

    #[test]
    fn test_sleep_wakes_on_shutdown() {
        let flag = ShutdownFlag::new();
        assert!(!flag.sleep(Duration::from_millis(1)));

        let remote = flag.clone();
        let handle = thread::spawn(move || remote.sleep(Duration::from_secs(30)));
        flag.trigger();
        assert!(handle.join().unwrap());
    }
}

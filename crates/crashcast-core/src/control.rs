//! Runtime control state shared between the round loop and the process
//! shutdown path.
//!
//! All fields are atomics wrapped in [`Arc`](std::sync::Arc) by callers so
//! the round loop reads them lock-free on its hot path. A stop request is
//! honored between rounds: the round in progress always drains to its
//! crash and settles before the loop exits.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Lowest accepted tick interval in milliseconds.
const MIN_TICK_INTERVAL_MS: u64 = 10;

/// Shared control state for the round loop.
#[derive(Debug)]
pub struct ControlState {
    /// Whether a clean stop has been requested.
    stop_requested: AtomicBool,

    /// Current live-score tick interval in milliseconds (runtime-adjustable).
    tick_interval_ms: AtomicU64,

    /// Current pause between rounds in milliseconds (runtime-adjustable).
    inter_round_pause_ms: AtomicU64,
}

impl ControlState {
    /// Create a control state with the given initial timings.
    pub const fn new(tick_interval_ms: u64, inter_round_pause_ms: u64) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            inter_round_pause_ms: AtomicU64::new(inter_round_pause_ms),
        }
    }

    /// Request a clean stop. The loop finishes the round in progress,
    /// settles it, and exits instead of starting another.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Get the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Set the tick interval in milliseconds. Must be at least 10ms.
    ///
    /// Returns the previous interval on success, or `None` if the value
    /// was rejected.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        let prev = self.tick_interval_ms.swap(ms, Ordering::AcqRel);
        Some(prev)
    }

    /// Get the current inter-round pause in milliseconds.
    pub fn inter_round_pause_ms(&self) -> u64 {
        self.inter_round_pause_ms.load(Ordering::Acquire)
    }

    /// Set the inter-round pause in milliseconds. Zero disables the pause.
    pub fn set_inter_round_pause_ms(&self, ms: u64) -> u64 {
        self.inter_round_pause_ms.swap(ms, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_request_latches() {
        let control = ControlState::new(50, 8_000);
        assert!(!control.is_stop_requested());
        control.request_stop();
        assert!(control.is_stop_requested());
    }

    #[test]
    fn tick_interval_rejects_below_minimum() {
        let control = ControlState::new(50, 8_000);
        assert_eq!(control.set_tick_interval_ms(5), None);
        assert_eq!(control.tick_interval_ms(), 50);
        assert_eq!(control.set_tick_interval_ms(100), Some(50));
        assert_eq!(control.tick_interval_ms(), 100);
    }

    #[test]
    fn inter_round_pause_accepts_zero() {
        let control = ControlState::new(50, 8_000);
        assert_eq!(control.set_inter_round_pause_ms(0), 8_000);
        assert_eq!(control.inter_round_pause_ms(), 0);
    }
}

//! Round callback that updates the observer API state.
//!
//! On every round-lifecycle emission this callback broadcasts the
//! corresponding [`GameEvent`] to all connected `WebSocket` observers and
//! mirrors the change into the [`LiveSnapshot`] that serves late-joiner
//! catch-up and REST reads.
//!
//! [`LiveSnapshot`]: crashcast_observer::LiveSnapshot

use std::sync::Arc;

use crashcast_core::runner::RoundCallback;
use crashcast_observer::AppState;
use crashcast_types::{GameEvent, RoundId, RoundLogEntry};
use rust_decimal::Decimal;
use tracing::debug;

/// Callback that bridges the round loop to the observer API.
pub struct BroadcastCallback {
    state: Arc<AppState>,
}

impl BroadcastCallback {
    /// Create a new broadcast callback backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Mirror an emission into the snapshot without blocking the loop.
    ///
    /// Uses `try_write`: if an observer handler holds the read lock right
    /// now, this update is skipped and the next emission catches up.
    fn update_snapshot(&self, update: impl FnOnce(&mut crashcast_observer::LiveSnapshot)) {
        if let Ok(mut live) = self.state.live.try_write() {
            update(&mut live);
        }
    }
}

impl RoundCallback for BroadcastCallback {
    fn on_round_start(
        &mut self,
        round_id: RoundId,
        crash_point: Decimal,
        history: &[RoundLogEntry],
    ) {
        let receivers = self.state.broadcast(&GameEvent::RoundStart {
            round_id,
            crash_point,
            previous_rounds: history.to_vec(),
        });
        debug!(%round_id, receivers, "Round start broadcast sent");

        self.update_snapshot(|live| {
            live.round_id = Some(round_id);
            live.crash_point = Some(crash_point);
            live.live_score = Decimal::new(100, 2);
            live.crashed = false;
            live.previous_rounds = history.to_vec();
        });
    }

    fn on_live_score(&mut self, value: Decimal) {
        let _ = self.state.broadcast(&GameEvent::LiveScore { value });
        self.update_snapshot(|live| {
            live.live_score = value;
        });
    }

    fn on_crashed(&mut self, crash_point: Decimal) {
        let receivers = self.state.broadcast(&GameEvent::Crashed { value: crash_point });
        debug!(%crash_point, receivers, "Crash broadcast sent");

        self.update_snapshot(|live| {
            live.live_score = crash_point;
            live.crashed = true;
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[tokio::test]
    async fn emissions_reach_subscribers_and_snapshot() {
        let state = Arc::new(AppState::new());
        let mut rx = state.subscribe();
        let mut callback = BroadcastCallback::new(Arc::clone(&state));

        let history = vec![RoundLogEntry {
            round_id: RoundId(1),
            crash_point: dec(199),
            created_at: Utc::now(),
        }];

        callback.on_round_start(RoundId(2), dec(350), &history);
        callback.on_live_score(dec(101));
        callback.on_crashed(dec(350));

        // All three frames arrive in order.
        assert!(matches!(
            rx.recv().await.unwrap(),
            GameEvent::RoundStart { round_id: RoundId(2), .. }
        ));
        assert!(matches!(rx.recv().await.unwrap(), GameEvent::LiveScore { .. }));
        assert!(matches!(rx.recv().await.unwrap(), GameEvent::Crashed { .. }));

        // The snapshot mirrors the final state.
        let live = state.live.read().await;
        assert_eq!(live.round_id, Some(RoundId(2)));
        assert_eq!(live.crash_point, Some(dec(350)));
        assert_eq!(live.live_score, dec(350));
        assert!(live.crashed);
        assert_eq!(live.previous_rounds.len(), 1);
    }

    #[tokio::test]
    async fn round_start_resets_the_snapshot_score() {
        let state = Arc::new(AppState::new());
        let mut callback = BroadcastCallback::new(Arc::clone(&state));

        callback.on_round_start(RoundId(1), dec(4_200), &[]);
        callback.on_live_score(dec(105));
        callback.on_crashed(dec(4_200));
        callback.on_round_start(RoundId(2), dec(150), &[]);

        let live = state.live.read().await;
        assert_eq!(live.live_score, dec(100));
        assert!(!live.crashed);
        assert_eq!(live.round_id, Some(RoundId(2)));
    }
}

//! Shared application state for the observer server.
//!
//! [`AppState`] holds the broadcast channel that fans game events out to
//! every connected `WebSocket` observer, and the [`LiveSnapshot`] the
//! engine updates on every emission. The snapshot is the single source of
//! truth for late-joiner catch-up: the connect handler reads the same
//! state the round loop writes, so a new observer is synchronized without
//! waiting for the next tick.

use std::sync::Arc;

use crashcast_types::{GameEvent, RoundId, RoundLogEntry};
use rust_decimal::Decimal;
use tokio::sync::{RwLock, broadcast};

/// Capacity of the broadcast channel for game events.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// The engine-maintained mirror of the round in play.
///
/// Updated by the engine's broadcast callback; read by the `WebSocket`
/// connect handler and the REST endpoints.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    /// Identifier of the round in progress, absent before the first round.
    pub round_id: Option<RoundId>,
    /// Crash point of the round in progress, absent before the first round.
    pub crash_point: Option<Decimal>,
    /// The live multiplier as of the last tick.
    pub live_score: Decimal,
    /// Whether the current round has crashed.
    pub crashed: bool,
    /// Completed rounds, most recent first (bounded by the engine's
    /// history limit).
    pub previous_rounds: Vec<RoundLogEntry>,
}

impl Default for LiveSnapshot {
    fn default() -> Self {
        Self {
            round_id: None,
            crash_point: None,
            live_score: Decimal::new(100, 2),
            crashed: false,
            previous_rounds: Vec::new(),
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The
/// broadcast sender pushes game events to all connected `WebSocket`
/// observers; the snapshot answers late-joiner and REST reads.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for game event frames.
    pub tx: broadcast::Sender<GameEvent>,
    /// The current live snapshot (updated on every engine emission).
    pub live: Arc<RwLock<LiveSnapshot>>,
}

impl AppState {
    /// Create a new application state with an idle snapshot.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            live: Arc::new(RwLock::new(LiveSnapshot::default())),
        }
    }

    /// Subscribe to the game event broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }

    /// Publish a game event to all connected observers.
    ///
    /// Returns the number of receivers that got the message. Zero simply
    /// means no observer is connected, which is not an error.
    pub fn broadcast(&self, event: &GameEvent) -> usize {
        // send returns Err only when there are zero receivers, which is
        // normal when no WebSocket observers are connected.
        self.tx.send(event.clone()).unwrap_or(0)
    }

    /// Build the catch-up frame for a newly connected observer.
    ///
    /// Reflects the snapshot at connection time: round id and crash point
    /// of the round in progress (absent during the startup race before
    /// the first round), the history, and the current live score.
    pub async fn init_data(&self) -> GameEvent {
        let live = self.live.read().await;
        GameEvent::InitData {
            round_id: live.round_id,
            crash_point: live.crash_point,
            previous_rounds: live.previous_rounds.clone(),
            live_score: live.live_score,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[tokio::test]
    async fn late_joiner_sees_the_running_round() {
        let state = AppState::new();
        {
            let mut live = state.live.write().await;
            live.round_id = Some(RoundId(42));
            live.crash_point = Some(Decimal::new(35, 1));
            live.live_score = dec(120);
            live.previous_rounds = vec![RoundLogEntry {
                round_id: RoundId(41),
                crash_point: dec(210),
                created_at: Utc::now(),
            }];
        }

        let init = state.init_data().await;
        match init {
            GameEvent::InitData {
                round_id,
                crash_point,
                previous_rounds,
                live_score,
            } => {
                assert_eq!(round_id, Some(RoundId(42)));
                assert_eq!(crash_point, Some(Decimal::new(35, 1)));
                assert_eq!(live_score, dec(120));
                assert_eq!(previous_rounds.len(), 1);
            }
            other => panic!("expected initData, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn init_data_is_idle_before_first_round() {
        let state = AppState::new();
        let init = state.init_data().await;
        assert_eq!(
            init,
            GameEvent::InitData {
                round_id: None,
                crash_point: None,
                previous_rounds: Vec::new(),
                live_score: dec(100),
            }
        );
    }

    #[tokio::test]
    async fn broadcast_without_observers_is_not_an_error() {
        let state = AppState::new();
        let receivers = state.broadcast(&GameEvent::LiveScore { value: dec(101) });
        assert_eq!(receivers, 0);
    }

    #[tokio::test]
    async fn subscribers_receive_broadcasts() {
        let state = AppState::new();
        let mut rx = state.subscribe();

        let event = GameEvent::Crashed { value: dec(250) };
        let receivers = state.broadcast(&event);
        assert_eq!(receivers, 1);
        assert_eq!(rx.recv().await.ok(), Some(event));
    }
}

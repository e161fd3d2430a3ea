//! The round scheduler loop.
//!
//! This module provides [`run_rounds`], the top-level async function that
//! drives the game indefinitely: pull the earliest backlog round, play its
//! live-score progression to the crash, settle it, keep the backlog
//! replenished, and pause before the next round. The loop's states are
//!
//! ```text
//! BacklogCheck -> RoundStart -> LiveProgression -> Crashed
//!      ^                                              |
//!      +---- InterRoundPause <---- Settle <-----------+
//! ```
//!
//! There is no terminal state under normal operation; the loop runs for
//! the life of the process and exits only on a clean stop request, after
//! draining the round in progress.
//!
//! Persistence failures never kill the loop: they are logged and retried
//! on the next pass. An empty backlog is always recoverable through the
//! reactive refill in the backlog check.

use std::time::Duration;

use chrono::Utc;
use crashcast_types::{Round, RoundId, RoundLogEntry};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, trace, warn};

use crate::config::GameConfig;
use crate::control::ControlState;
use crate::generator::{self, GeneratorState};
use crate::progression::{LiveRound, TickOutcome};
use crate::store::{RoundStore, StoreError};

/// Reason why the round loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// A clean stop was requested via [`ControlState::request_stop`].
    StopRequested,
}

/// Result of a round loop run.
#[derive(Debug)]
pub struct RunSummary {
    /// The reason the loop ended.
    pub end_reason: EndReason,
    /// Number of rounds fully played and settled.
    pub rounds_played: u64,
}

/// Callback invoked at each observable point of the round lifecycle.
///
/// Implementations fan the events out to observers (broadcast channel,
/// snapshot update). The callback is synchronous so the loop's timing is
/// never at the mercy of a slow observer.
pub trait RoundCallback: Send {
    /// A round is starting. `history` holds up to the configured number of
    /// completed rounds, newest first.
    fn on_round_start(&mut self, round_id: RoundId, crash_point: Decimal, history: &[RoundLogEntry]);

    /// The live score advanced one tick.
    fn on_live_score(&mut self, value: Decimal);

    /// The round crashed at `crash_point`. Called exactly once per round.
    fn on_crashed(&mut self, crash_point: Decimal);
}

/// A no-op callback for tests and storeless runs.
pub struct NoOpCallback;

impl RoundCallback for NoOpCallback {
    fn on_round_start(
        &mut self,
        _round_id: RoundId,
        _crash_point: Decimal,
        _history: &[RoundLogEntry],
    ) {
    }

    fn on_live_score(&mut self, _value: Decimal) {}

    fn on_crashed(&mut self, _crash_point: Decimal) {}
}

/// Run the round loop until a stop is requested.
///
/// # Arguments
///
/// * `store` - Backlog and log persistence
/// * `generator` - Crash-point generator state (scheduler-owned)
/// * `rng` - Randomness source for crash points
/// * `control` - Shared stop/timing control
/// * `callback` - Observable-event sink
/// * `game` - Backlog and history sizing, retry delay
pub async fn run_rounds<S, R>(
    store: &S,
    generator: &mut GeneratorState,
    rng: &mut R,
    control: &ControlState,
    callback: &mut dyn RoundCallback,
    game: &GameConfig,
) -> RunSummary
where
    S: RoundStore,
    R: Rng,
{
    let mut rounds_played: u64 = 0;

    info!(
        backlog_target = game.backlog_target,
        tick_interval_ms = control.tick_interval_ms(),
        inter_round_pause_ms = control.inter_round_pause_ms(),
        "Round loop starting"
    );

    loop {
        // --- Check stop (between rounds only: a started round drains) ---
        if control.is_stop_requested() {
            info!(rounds_played, "Stop requested, round loop exiting");
            return RunSummary {
                end_reason: EndReason::StopRequested,
                rounds_played,
            };
        }

        // --- BacklogCheck ---
        let round = match backlog_check(store, generator, rng, game).await {
            Ok(round) => round,
            Err(e) => {
                warn!(error = %e, "Backlog check failed, retrying");
                tokio::time::sleep(Duration::from_millis(game.retry_delay_ms)).await;
                continue;
            }
        };

        // --- RoundStart ---
        if let Err(e) = store.mark_running(round.id).await {
            warn!(error = %e, backlog_id = round.id, "Failed to mark round running, retrying");
            tokio::time::sleep(Duration::from_millis(game.retry_delay_ms)).await;
            continue;
        }

        // A missing history snapshot only degrades the display; the round
        // still plays.
        let history = match store.recent_history(game.history_limit).await {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "History read failed, starting round without history");
                Vec::new()
            }
        };

        let mut live = LiveRound::new(round.round_id, round.crash_point);
        callback.on_round_start(round.round_id, round.crash_point, &history);
        info!(
            round_id = %round.round_id,
            crash_point = %round.crash_point,
            backlog_id = round.id,
            "Round started"
        );

        // --- LiveProgression ---
        loop {
            tokio::time::sleep(Duration::from_millis(control.tick_interval_ms())).await;
            match live.advance() {
                Some(TickOutcome::Live(score)) => {
                    trace!(score = %score, "Live score");
                    callback.on_live_score(score);
                }
                Some(TickOutcome::Crashed(point)) => {
                    callback.on_crashed(point);
                    info!(round_id = %round.round_id, crash_point = %point, "Round crashed");
                    break;
                }
                None => break,
            }
        }

        // --- Settle ---
        settle(store, generator, rng, &round, game).await;
        rounds_played = rounds_played.saturating_add(1);

        // --- InterRoundPause ---
        if control.is_stop_requested() {
            info!(rounds_played, "Stop requested, round loop exiting");
            return RunSummary {
                end_reason: EndReason::StopRequested,
                rounds_played,
            };
        }
        let pause_ms = control.inter_round_pause_ms();
        if pause_ms > 0 {
            tokio::time::sleep(Duration::from_millis(pause_ms)).await;
        }
    }
}

/// Pull the earliest backlog round, refilling reactively when empty.
///
/// The refill generates a full batch of `backlog_target` rounds with
/// wall-clock-derived identifiers, offset per slot so one clock reading
/// cannot collide with itself.
async fn backlog_check<S, R>(
    store: &S,
    generator: &mut GeneratorState,
    rng: &mut R,
    game: &GameConfig,
) -> Result<Round, StoreError>
where
    S: RoundStore,
    R: Rng,
{
    loop {
        if let Some(round) = store.earliest_pending().await? {
            return Ok(round);
        }

        warn!(target = game.backlog_target, "Backlog empty, refilling");
        let batch = generate_batch(generator, rng, game.backlog_target);
        store.enqueue_many(&batch).await?;
    }
}

/// Generate `count` fresh rounds with monotonically increasing identifiers.
fn generate_batch<R: Rng>(
    generator: &mut GeneratorState,
    rng: &mut R,
    count: u32,
) -> Vec<(RoundId, Decimal)> {
    let base = Utc::now().timestamp_millis();
    (0..count)
        .map(|slot| {
            let offset = i64::from(slot);
            (
                RoundId(base.saturating_add(offset)),
                generator::generate(generator, rng),
            )
        })
        .collect()
}

/// Settle a crashed round: move it to the log, trim the log, and enqueue
/// exactly one replacement to hold the backlog at steady state.
///
/// Every failure here is recoverable on a later pass, so this never
/// propagates an error: a failed completion leaves the round in the
/// backlog to be re-read and replayed, and a failed replacement is made
/// up by the reactive refill.
async fn settle<S, R>(
    store: &S,
    generator: &mut GeneratorState,
    rng: &mut R,
    round: &Round,
    game: &GameConfig,
) where
    S: RoundStore,
    R: Rng,
{
    if let Err(e) = store
        .complete_and_log(round.id, round.round_id, round.crash_point)
        .await
    {
        warn!(
            error = %e,
            round_id = %round.round_id,
            "Settle failed, round will be re-read on the next pass"
        );
        return;
    }

    if let Err(e) = store.trim_log(game.log_cap).await {
        warn!(error = %e, "Log trim failed, history stays over cap until the next settle");
    }

    let crash_point = generator::generate(generator, rng);
    let round_id = RoundId(Utc::now().timestamp_millis());
    if let Err(e) = store.enqueue(round_id, crash_point).await {
        warn!(error = %e, "Replacement enqueue failed, reactive refill will recover");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::store::MemoryRoundStore;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn fast_game() -> GameConfig {
        GameConfig {
            retry_delay_ms: 1,
            ..GameConfig::default()
        }
    }

    /// Records every emission and requests a stop after a configured
    /// number of crashes.
    struct RecordingCallback {
        control: Arc<ControlState>,
        stop_after_crashes: usize,
        starts: Vec<(RoundId, Decimal, usize)>,
        scores: Vec<Decimal>,
        crashes: Vec<Decimal>,
        round_crashed: bool,
    }

    impl RecordingCallback {
        fn new(control: Arc<ControlState>, stop_after_crashes: usize) -> Self {
            Self {
                control,
                stop_after_crashes,
                starts: Vec::new(),
                scores: Vec::new(),
                crashes: Vec::new(),
                round_crashed: false,
            }
        }
    }

    impl RoundCallback for RecordingCallback {
        fn on_round_start(
            &mut self,
            round_id: RoundId,
            crash_point: Decimal,
            history: &[RoundLogEntry],
        ) {
            self.round_crashed = false;
            self.starts.push((round_id, crash_point, history.len()));
        }

        fn on_live_score(&mut self, value: Decimal) {
            assert!(!self.round_crashed, "live score emitted after crash");
            self.scores.push(value);
        }

        fn on_crashed(&mut self, crash_point: Decimal) {
            assert!(!self.round_crashed, "second crash emission in one round");
            self.round_crashed = true;
            self.crashes.push(crash_point);
            if self.crashes.len() >= self.stop_after_crashes {
                self.control.request_stop();
            }
        }
    }

    #[tokio::test]
    async fn single_round_lifecycle() {
        let store = MemoryRoundStore::new();
        store.enqueue(RoundId(42), dec(105)).await.unwrap();

        let control = Arc::new(ControlState::new(10, 0));
        let mut callback = RecordingCallback::new(Arc::clone(&control), 1);
        let mut generator = GeneratorState::new();
        let mut rng = SmallRng::seed_from_u64(1);

        let summary = run_rounds(
            &store,
            &mut generator,
            &mut rng,
            &control,
            &mut callback,
            &fast_game(),
        )
        .await;

        assert_eq!(summary.end_reason, EndReason::StopRequested);
        assert_eq!(summary.rounds_played, 1);

        // One start with empty history, scores 1.01 through 1.04, one crash.
        assert_eq!(callback.starts, vec![(RoundId(42), dec(105), 0)]);
        assert_eq!(
            callback.scores,
            vec![dec(101), dec(102), dec(103), dec(104)]
        );
        assert_eq!(callback.crashes, vec![dec(105)]);

        // Settled: logged, removed from the backlog, one replacement queued.
        let history = store.recent_history(20).await.unwrap();
        assert_eq!(history.first().map(|e| e.round_id), Some(RoundId(42)));
        let backlog = store.backlog_snapshot().await;
        assert_eq!(backlog.len(), 1);
        assert!(backlog.iter().all(|r| !r.running));
    }

    #[tokio::test]
    async fn empty_backlog_refills_to_target() {
        let store = MemoryRoundStore::new();
        let control = Arc::new(ControlState::new(1, 0));
        let mut callback = RecordingCallback::new(Arc::clone(&control), 1);
        let mut generator = GeneratorState::new();
        let mut rng = SmallRng::seed_from_u64(7);

        let summary = run_rounds(
            &store,
            &mut generator,
            &mut rng,
            &control,
            &mut callback,
            &fast_game(),
        )
        .await;

        assert_eq!(summary.rounds_played, 1);
        assert_eq!(callback.starts.len(), 1);

        // Refilled to 30, one played and removed, one replacement added.
        assert_eq!(store.backlog_size().await.unwrap(), 30);
    }

    #[tokio::test]
    async fn score_resets_each_round() {
        let store = MemoryRoundStore::new();
        for n in 0..3_i64 {
            store.enqueue(RoundId(n), dec(103)).await.unwrap();
        }

        let control = Arc::new(ControlState::new(10, 0));
        let mut callback = RecordingCallback::new(Arc::clone(&control), 3);
        let mut generator = GeneratorState::new();
        let mut rng = SmallRng::seed_from_u64(3);

        let summary = run_rounds(
            &store,
            &mut generator,
            &mut rng,
            &control,
            &mut callback,
            &fast_game(),
        )
        .await;

        assert_eq!(summary.rounds_played, 3);
        // Every round climbs 1.01, 1.02 and then crashes at 1.03: the
        // score provably reset to 1.00 at each round start.
        assert_eq!(
            callback.scores,
            vec![dec(101), dec(102), dec(101), dec(102), dec(101), dec(102)]
        );
        assert_eq!(callback.crashes, vec![dec(103), dec(103), dec(103)]);

        // History arrives newest-first and grows round over round.
        assert_eq!(
            callback.starts.iter().map(|s| s.2).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    /// Store wrapper that injects failures into the first N backlog reads.
    struct FlakyStore {
        inner: MemoryRoundStore,
        failures_left: AtomicU32,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                inner: MemoryRoundStore::new(),
                failures_left: AtomicU32::new(failures),
            }
        }
    }

    impl RoundStore for FlakyStore {
        async fn enqueue(
            &self,
            round_id: RoundId,
            crash_point: Decimal,
        ) -> Result<(), StoreError> {
            self.inner.enqueue(round_id, crash_point).await
        }

        async fn earliest_pending(&self) -> Result<Option<Round>, StoreError> {
            if self.failures_left.load(Ordering::Acquire) > 0 {
                self.failures_left.fetch_sub(1, Ordering::AcqRel);
                return Err(StoreError::Persistence {
                    message: String::from("injected failure"),
                });
            }
            self.inner.earliest_pending().await
        }

        async fn mark_running(&self, id: i64) -> Result<(), StoreError> {
            self.inner.mark_running(id).await
        }

        async fn complete_and_log(
            &self,
            id: i64,
            round_id: RoundId,
            crash_point: Decimal,
        ) -> Result<(), StoreError> {
            self.inner.complete_and_log(id, round_id, crash_point).await
        }

        async fn trim_log(&self, cap: u32) -> Result<(), StoreError> {
            self.inner.trim_log(cap).await
        }

        async fn recent_history(&self, limit: u32) -> Result<Vec<RoundLogEntry>, StoreError> {
            self.inner.recent_history(limit).await
        }

        async fn backlog_size(&self) -> Result<u64, StoreError> {
            self.inner.backlog_size().await
        }
    }

    #[tokio::test]
    async fn transient_store_failure_recovers() {
        let store = FlakyStore::new(2);
        store.enqueue(RoundId(9), dec(102)).await.unwrap();

        let control = Arc::new(ControlState::new(10, 0));
        let mut callback = RecordingCallback::new(Arc::clone(&control), 1);
        let mut generator = GeneratorState::new();
        let mut rng = SmallRng::seed_from_u64(5);

        let summary = run_rounds(
            &store,
            &mut generator,
            &mut rng,
            &control,
            &mut callback,
            &fast_game(),
        )
        .await;

        // The two injected failures were logged and retried; the round
        // still played to its crash.
        assert_eq!(summary.rounds_played, 1);
        assert_eq!(callback.crashes, vec![dec(102)]);
    }

    #[tokio::test]
    async fn stop_before_first_round_plays_nothing() {
        let store = MemoryRoundStore::new();
        let control = Arc::new(ControlState::new(10, 0));
        control.request_stop();
        let mut callback = RecordingCallback::new(Arc::clone(&control), 1);
        let mut generator = GeneratorState::new();
        let mut rng = SmallRng::seed_from_u64(11);

        let summary = run_rounds(
            &store,
            &mut generator,
            &mut rng,
            &control,
            &mut callback,
            &fast_game(),
        )
        .await;

        assert_eq!(summary.end_reason, EndReason::StopRequested);
        assert_eq!(summary.rounds_played, 0);
        assert!(callback.starts.is_empty());
        assert_eq!(store.backlog_size().await.unwrap(), 0);
    }
}

//! Live-score progression for the round in play.
//!
//! The multiplier starts at 1.00 and climbs by a tiered additive step on
//! every tick: the absolute step grows with the score, which shrinks the
//! *relative* growth as the score rises and produces the characteristic
//! accelerating-then-plateauing visual climb (not true exponential
//! growth). The round crashes the instant the score reaches its
//! pre-determined crash point; the crash latch flips exactly once.

use crashcast_types::RoundId;
use rust_decimal::Decimal;

/// Result of advancing the live round by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The score advanced and the round is still live.
    Live(Decimal),
    /// The score reached the crash point on this tick. Carries the final
    /// crash multiplier. Emitted exactly once per round.
    Crashed(Decimal),
}

/// The transient state of the round currently being played.
///
/// Rebuilt at every round start; owned by the scheduler while the round is
/// in progress. The observer snapshot mirrors this state so late joiners
/// can be caught up without touching the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRound {
    round_id: RoundId,
    crash_point: Decimal,
    live_score: Decimal,
    crashed: bool,
}

impl LiveRound {
    /// Start a fresh live round at score 1.00 with the crash latch clear.
    pub fn new(round_id: RoundId, crash_point: Decimal) -> Self {
        Self {
            round_id,
            crash_point,
            live_score: Decimal::new(100, 2),
            crashed: false,
        }
    }

    /// The round's identifier.
    pub const fn round_id(&self) -> RoundId {
        self.round_id
    }

    /// The pre-determined crash multiplier.
    pub const fn crash_point(&self) -> Decimal {
        self.crash_point
    }

    /// The current live multiplier.
    pub const fn live_score(&self) -> Decimal {
        self.live_score
    }

    /// Whether the crash latch has fired.
    pub const fn is_crashed(&self) -> bool {
        self.crashed
    }

    /// Advance the score by one tick.
    ///
    /// Returns `None` once the round has crashed: the latch is idempotent,
    /// so a tick that fires after the crash (before the timer is torn
    /// down) produces no second emission. Otherwise returns the tick's
    /// outcome -- either the new live score or, if the step carried the
    /// score to or past the crash point, the one-and-only crash.
    pub fn advance(&mut self) -> Option<TickOutcome> {
        if self.crashed {
            return None;
        }

        let step = step_for(self.live_score);
        self.live_score = self.live_score.saturating_add(step).round_dp(2);

        if self.live_score >= self.crash_point {
            self.crashed = true;
            Some(TickOutcome::Crashed(self.crash_point))
        } else {
            Some(TickOutcome::Live(self.live_score))
        }
    }
}

/// The additive step applied at the given score.
///
/// | score range | step |
/// |-------------|------|
/// | < 1.5       | 0.01 |
/// | [1.5, 3.0)  | 0.02 |
/// | [3.0, 5.0)  | 0.05 |
/// | [5.0, 10.0) | 0.10 |
/// | [10.0, 50.0)| 0.15 |
/// | >= 50.0     | 0.20 |
fn step_for(score: Decimal) -> Decimal {
    if score < Decimal::new(150, 2) {
        Decimal::new(1, 2)
    } else if score < Decimal::new(300, 2) {
        Decimal::new(2, 2)
    } else if score < Decimal::new(500, 2) {
        Decimal::new(5, 2)
    } else if score < Decimal::new(1_000, 2) {
        Decimal::new(10, 2)
    } else if score < Decimal::new(5_000, 2) {
        Decimal::new(15, 2)
    } else {
        Decimal::new(20, 2)
    }
}

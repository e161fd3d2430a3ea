//! Round entity structs: the backlog entry and the completed-round log row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::RoundId;

/// A not-yet-played round sitting in the backlog.
///
/// Rounds are created with their crash point already fixed; the scheduler
/// consumes the backlog in `id` order and never recomputes a crash point.
/// At most one round carries `running = true` at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Round {
    /// Store-assigned sequence number. FIFO order: smallest plays next.
    pub id: i64,
    /// Externally visible round identifier.
    pub round_id: RoundId,
    /// Pre-determined crash multiplier, strictly greater than 1.00,
    /// exactly two decimal places.
    #[ts(as = "String")]
    pub crash_point: Decimal,
    /// True only while this round is being played.
    pub running: bool,
    /// When the round was enqueued.
    pub created_at: DateTime<Utc>,
}

/// An append-only record of a completed round.
///
/// The log is capped to the most recent 200 entries; trimming evicts the
/// oldest rows first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RoundLogEntry {
    /// Identifier of the completed round.
    pub round_id: RoundId,
    /// The multiplier the round crashed at.
    #[ts(as = "String")]
    pub crash_point: Decimal,
    /// When the round completed.
    pub created_at: DateTime<Utc>,
}

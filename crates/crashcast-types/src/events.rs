//! The observer wire protocol.
//!
//! Every frame pushed over the observer WebSocket is one [`GameEvent`],
//! serialized as a tagged JSON object (`"type"` discriminant, camelCase
//! payload fields). Three of the variants are broadcast to every connected
//! observer; `initData` is sent exactly once per connection so a late
//! joiner is synchronized without waiting for the next tick.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::RoundId;
use crate::rounds::RoundLogEntry;

/// A frame of the observer protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum GameEvent {
    /// Catch-up snapshot sent once to each newly connected observer.
    ///
    /// `round_id` and `crash_point` are `null` when no round is active
    /// yet (observer connected before the first round started).
    #[serde(rename_all = "camelCase")]
    InitData {
        /// Identifier of the round in progress, if any.
        round_id: Option<RoundId>,
        /// Crash point of the round in progress, if any.
        #[ts(as = "Option<String>")]
        crash_point: Option<Decimal>,
        /// Up to 20 completed rounds, most recent first.
        previous_rounds: Vec<RoundLogEntry>,
        /// The live multiplier at connection time.
        #[ts(as = "String")]
        live_score: Decimal,
    },

    /// A new round is starting.
    #[serde(rename_all = "camelCase")]
    RoundStart {
        /// Identifier of the starting round.
        round_id: RoundId,
        /// The round's crash point. Transmitted up front; observers are
        /// trusted to treat it as display-only (see DESIGN.md).
        #[ts(as = "String")]
        crash_point: Decimal,
        /// Up to 20 completed rounds, most recent first.
        previous_rounds: Vec<RoundLogEntry>,
    },

    /// The live multiplier advanced one tick.
    #[serde(rename_all = "camelCase")]
    LiveScore {
        /// The current multiplier, two decimal places.
        #[ts(as = "String")]
        value: Decimal,
    },

    /// The round crashed. Sent exactly once per round.
    #[serde(rename_all = "camelCase")]
    Crashed {
        /// The final crash multiplier.
        #[ts(as = "String")]
        value: Decimal,
    },
}

//! Round identifier type.
//!
//! Rounds carry a single externally visible identifier derived from the
//! wall clock at generation time (millisecond precision). Identifiers are
//! monotonically increasing within a process and unique on a best-effort
//! basis: refill batches offset each slot so no two rounds generated from
//! one clock reading collide, but uniqueness across rapid process restarts
//! is not enforced.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Externally visible identifier of a round.
///
/// Wraps the `i64` millisecond timestamp (plus batch offset) the round was
/// generated from. The store-assigned backlog sequence is a separate plain
/// `i64` and never leaves the persistence layer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct RoundId(pub i64);

impl RoundId {
    /// Return the inner `i64` value.
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for RoundId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RoundId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RoundId> for i64 {
    fn from(id: RoundId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_id_roundtrip_serde() {
        let original = RoundId(1_700_000_000_123);
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<RoundId, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn round_id_display_matches_inner() {
        let id = RoundId(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn round_id_orders_by_inner_value() {
        assert!(RoundId(1) < RoundId(2));
    }
}

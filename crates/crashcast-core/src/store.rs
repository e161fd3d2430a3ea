//! The round persistence interface and its in-memory implementation.
//!
//! [`RoundStore`] is the seam between the scheduler and whatever durable
//! store holds the backlog and the completed-round log. The production
//! implementation lives in `crashcast-db` (`PostgreSQL`);
//! [`MemoryRoundStore`] here lets the whole round loop be exercised in
//! tests without any infrastructure.
//!
//! An empty backlog is not an error: [`RoundStore::earliest_pending`]
//! returns `Ok(None)` and the scheduler recovers by refilling. Only real
//! persistence failures surface as [`StoreError`].

use chrono::Utc;
use crashcast_types::{Round, RoundId, RoundLogEntry};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

/// Errors that can occur in a round store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A read or write against the backing store failed.
    #[error("persistence failure: {message}")]
    Persistence {
        /// Description of the underlying failure.
        message: String,
    },
}

/// Durable backlog of not-yet-played rounds plus a bounded log of
/// completed rounds.
///
/// Implementations must keep the backlog ordered by store-assigned
/// sequence (`Round::id`) ascending; the earliest entry is the one played
/// next. Backlog mutations must be serialized if the store is shared, to
/// preserve the single-running-round invariant.
#[allow(async_fn_in_trait)]
pub trait RoundStore {
    /// Append a new backlog round with `running = false`.
    ///
    /// `round_id` uniqueness is caller discipline, not enforced here.
    async fn enqueue(&self, round_id: RoundId, crash_point: Decimal) -> Result<(), StoreError>;

    /// Append a batch of backlog rounds, preserving slice order.
    ///
    /// The default implementation loops [`enqueue`](Self::enqueue);
    /// backends with a cheaper bulk path should override it.
    async fn enqueue_many(&self, rounds: &[(RoundId, Decimal)]) -> Result<(), StoreError> {
        for &(round_id, crash_point) in rounds {
            self.enqueue(round_id, crash_point).await?;
        }
        Ok(())
    }

    /// Read the backlog entry with the smallest sequence, if any.
    ///
    /// The entry is not removed -- removal happens in
    /// [`complete_and_log`](Self::complete_and_log), so a round that fails
    /// to settle is re-read and replayed on the next pass.
    async fn earliest_pending(&self) -> Result<Option<Round>, StoreError>;

    /// Set `running = true` on the backlog entry with the given sequence.
    ///
    /// At most one entry may carry the flag; the scheduler deletes a
    /// completed round (rather than clearing its flag) before marking the
    /// next one.
    async fn mark_running(&self, id: i64) -> Result<(), StoreError>;

    /// Remove the backlog entry and append the completed round to the log,
    /// atomically where the backend supports it.
    async fn complete_and_log(
        &self,
        id: i64,
        round_id: RoundId,
        crash_point: Decimal,
    ) -> Result<(), StoreError>;

    /// Delete all log rows except the `cap` most recent.
    async fn trim_log(&self, cap: u32) -> Result<(), StoreError>;

    /// The most recent `limit` completed rounds, newest first.
    async fn recent_history(&self, limit: u32) -> Result<Vec<RoundLogEntry>, StoreError>;

    /// Number of rounds currently in the backlog.
    async fn backlog_size(&self) -> Result<u64, StoreError>;
}

/// In-memory [`RoundStore`] used by unit tests.
#[derive(Debug, Default)]
pub struct MemoryRoundStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: i64,
    backlog: Vec<Round>,
    log: Vec<RoundLogEntry>,
}

impl MemoryRoundStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the backlog in sequence order (test inspection).
    pub async fn backlog_snapshot(&self) -> Vec<Round> {
        self.inner.lock().await.backlog.clone()
    }

    /// Total number of rows in the log (test inspection).
    pub async fn log_len(&self) -> usize {
        self.inner.lock().await.log.len()
    }
}

impl RoundStore for MemoryRoundStore {
    async fn enqueue(&self, round_id: RoundId, crash_point: Decimal) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.next_id = inner.next_id.saturating_add(1);
        let id = inner.next_id;
        inner.backlog.push(Round {
            id,
            round_id,
            crash_point,
            running: false,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn earliest_pending(&self) -> Result<Option<Round>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.backlog.iter().min_by_key(|r| r.id).cloned())
    }

    async fn mark_running(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(round) = inner.backlog.iter_mut().find(|r| r.id == id) {
            round.running = true;
        }
        Ok(())
    }

    async fn complete_and_log(
        &self,
        id: i64,
        round_id: RoundId,
        crash_point: Decimal,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.backlog.retain(|r| r.id != id);
        inner.log.push(RoundLogEntry {
            round_id,
            crash_point,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn trim_log(&self, cap: u32) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let cap = usize::try_from(cap).unwrap_or(usize::MAX);
        let excess = inner.log.len().saturating_sub(cap);
        if excess > 0 {
            inner.log.drain(..excess);
        }
        Ok(())
    }

    async fn recent_history(&self, limit: u32) -> Result<Vec<RoundLogEntry>, StoreError> {
        let inner = self.inner.lock().await;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(inner.log.iter().rev().take(limit).cloned().collect())
    }

    async fn backlog_size(&self) -> Result<u64, StoreError> {
        let inner = self.inner.lock().await;
        Ok(u64::try_from(inner.backlog.len()).unwrap_or(u64::MAX))
    }
}

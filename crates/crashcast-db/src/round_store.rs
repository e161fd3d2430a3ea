//! `PostgreSQL`-backed [`RoundStore`] implementation.
//!
//! The backlog lives in `round_backlog` (FIFO by `BIGSERIAL` id), the
//! completed-round history in `round_log` (append-only, trimmed to a cap).
//! Crash points are stored as `NUMERIC(8,2)` so the two-decimal contract
//! survives the round trip exactly -- see DESIGN.md for the departure from
//! a raw float column.

use crashcast_core::store::{RoundStore, StoreError};
use crashcast_types::{Round, RoundId, RoundLogEntry};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::postgres::PostgresPool;

/// [`RoundStore`] backed by `PostgreSQL`.
///
/// All backlog mutations go through single statements or transactions, so
/// concurrent readers (observer REST handlers, admin queries) can never
/// observe a half-settled round.
#[derive(Clone)]
pub struct PgRoundStore {
    pool: PgPool,
}

impl PgRoundStore {
    /// Create a round store bound to a connection pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }
}

/// A row from the `round_backlog` table.
#[derive(Debug, sqlx::FromRow)]
struct BacklogRow {
    id: i64,
    round_id: i64,
    crash_point: Decimal,
    running: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<BacklogRow> for Round {
    fn from(row: BacklogRow) -> Self {
        Self {
            id: row.id,
            round_id: RoundId(row.round_id),
            crash_point: row.crash_point,
            running: row.running,
            created_at: row.created_at,
        }
    }
}

/// A row from the `round_log` table.
#[derive(Debug, sqlx::FromRow)]
struct LogRow {
    round_id: i64,
    crash_point: Decimal,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<LogRow> for RoundLogEntry {
    fn from(row: LogRow) -> Self {
        Self {
            round_id: RoundId(row.round_id),
            crash_point: row.crash_point,
            created_at: row.created_at,
        }
    }
}

/// Map a sqlx failure into the engine-facing store error.
fn store_err(e: sqlx::Error) -> StoreError {
    StoreError::Persistence {
        message: e.to_string(),
    }
}

impl RoundStore for PgRoundStore {
    async fn enqueue(&self, round_id: RoundId, crash_point: Decimal) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO round_backlog (round_id, crash_point) VALUES ($1, $2)")
            .bind(round_id.into_inner())
            .bind(crash_point)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn enqueue_many(&self, rounds: &[(RoundId, Decimal)]) -> Result<(), StoreError> {
        if rounds.is_empty() {
            return Ok(());
        }

        // Single multi-row INSERT via UNNEST instead of N round-trips.
        let mut round_ids = Vec::with_capacity(rounds.len());
        let mut crash_points = Vec::with_capacity(rounds.len());
        for &(round_id, crash_point) in rounds {
            round_ids.push(round_id.into_inner());
            crash_points.push(crash_point);
        }

        sqlx::query(
            r"INSERT INTO round_backlog (round_id, crash_point)
              SELECT * FROM UNNEST($1::BIGINT[], $2::NUMERIC[])",
        )
        .bind(&round_ids)
        .bind(&crash_points)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        tracing::debug!(count = rounds.len(), "Enqueued rounds (batch UNNEST)");
        Ok(())
    }

    async fn earliest_pending(&self) -> Result<Option<Round>, StoreError> {
        let row = sqlx::query_as::<_, BacklogRow>(
            r"SELECT id, round_id, crash_point, running, created_at
              FROM round_backlog
              ORDER BY id
              LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(Round::from))
    }

    async fn mark_running(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE round_backlog SET running = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn complete_and_log(
        &self,
        id: i64,
        round_id: RoundId,
        crash_point: Decimal,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        sqlx::query("DELETE FROM round_backlog WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        sqlx::query("INSERT INTO round_log (round_id, crash_point) VALUES ($1, $2)")
            .bind(round_id.into_inner())
            .bind(crash_point)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(())
    }

    async fn trim_log(&self, cap: u32) -> Result<(), StoreError> {
        sqlx::query(
            r"DELETE FROM round_log
              WHERE id NOT IN (SELECT id FROM round_log ORDER BY id DESC LIMIT $1)",
        )
        .bind(i64::from(cap))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn recent_history(&self, limit: u32) -> Result<Vec<RoundLogEntry>, StoreError> {
        let rows = sqlx::query_as::<_, LogRow>(
            r"SELECT round_id, crash_point, created_at
              FROM round_log
              ORDER BY id DESC
              LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(RoundLogEntry::from).collect())
    }

    async fn backlog_size(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM round_backlog")
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TTL leases keyed by run id — the sole concurrency primitive between
//! workers. `acquire` is executed under a raw `BEGIN IMMEDIATE` transaction
//! so two concurrent callers can't both observe a stale row: sqlx's
//! `Transaction` API doesn't expose SQLite's locking-mode selection, so we
//! issue the locking statement ourselves.

use crate::error::StorageResult;
use av_core::{Clock, RunId};
use chrono::Duration;
use sqlx::{Row, SqlitePool};

#[derive(Clone)]
pub struct LeaseStore<C: Clock> {
    pool: SqlitePool,
    clock: C,
}

impl<C: Clock> LeaseStore<C> {
    pub fn new(pool: SqlitePool, clock: C) -> Self {
        Self { pool, clock }
    }

    /// Attempts to take (or re-take, past expiry) the lease on `run_id` for
    /// `owner_id`. Returns `false` without side effects if another owner
    /// currently holds an unexpired lease.
    pub async fn acquire(&self, run_id: &RunId, owner_id: &str, ttl: Duration) -> StorageResult<bool> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let existing = sqlx::query("SELECT expires_at FROM leases_v2 WHERE run_id = ?")
            .bind(run_id.as_str())
            .fetch_optional(&mut *conn)
            .await?;

        let now = self.clock.now();
        let expired = match &existing {
            None => true,
            Some(row) => {
                let expires_at: String = row.try_get("expires_at")?;
                let expires_at = chrono::DateTime::parse_from_rfc3339(&expires_at)
                    .map(|t| t.with_timezone(&chrono::Utc))
                    .unwrap_or(now);
                expires_at <= now
            }
        };

        if !expired {
            sqlx::query("ROLLBACK").execute(&mut *conn).await?;
            return Ok(false);
        }

        let expires_at = now + ttl;
        sqlx::query(
            r#"
            INSERT INTO leases_v2 (run_id, owner_id, acquired_at, renewed_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (run_id) DO UPDATE SET
                owner_id = excluded.owner_id,
                acquired_at = excluded.acquired_at,
                renewed_at = excluded.renewed_at,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(run_id.as_str())
        .bind(owner_id)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&mut *conn)
        .await?;

        sqlx::query("COMMIT").execute(&mut *conn).await?;
        Ok(true)
    }

    /// Extends an owned, currently-held lease. Returns `false` if the lease
    /// is absent or owned by someone else.
    pub async fn renew(&self, run_id: &RunId, owner_id: &str, ttl: Duration) -> StorageResult<bool> {
        let now = self.clock.now();
        let expires_at = now + ttl;
        let rows = sqlx::query(
            r#"
            UPDATE leases_v2
            SET renewed_at = ?, expires_at = ?
            WHERE run_id = ? AND owner_id = ?
            "#,
        )
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .bind(run_id.as_str())
        .bind(owner_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows > 0)
    }

    /// Releases an owned lease. Idempotent: no error if absent or owned by
    /// someone else (those are both "not my lease to release" in practice).
    pub async fn release(&self, run_id: &RunId, owner_id: &str) -> StorageResult<()> {
        sqlx::query("DELETE FROM leases_v2 WHERE run_id = ? AND owner_id = ?")
            .bind(run_id.as_str())
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "lease_store_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Versioned, named configuration blobs (`config_versions`) plus a flat
//! key/value overlay (`kv_overlay`) used for single-value operator toggles.

use crate::error::StorageResult;
use av_core::{Clock, ConfigVersion};
use sqlx::{Row, SqlitePool};

#[derive(Clone)]
pub struct ConfigRegistry<C: Clock> {
    pool: SqlitePool,
    clock: C,
}

impl<C: Clock> ConfigRegistry<C> {
    pub fn new(pool: SqlitePool, clock: C) -> Self {
        Self { pool, clock }
    }

    /// Returns the newest active config row for `kind`, or `None`. Absence is
    /// a valid state, not an error — callers that need to distinguish
    /// "never configured" from "configured but empty" should check for
    /// `None` explicitly rather than treating it as a failure.
    pub async fn get_active(&self, kind: &str) -> StorageResult<Option<ConfigVersion>> {
        let row = sqlx::query(
            r#"
            SELECT id, kind, version, created_at, created_by, is_active, blob_json
            FROM config_versions WHERE kind = ? AND is_active = 1
            ORDER BY version DESC LIMIT 1
            "#,
        )
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_config).transpose()
    }

    /// Idempotent insert: a no-op if any active row for `kind` already
    /// exists, otherwise inserts `blob` as the first active version. Runs
    /// under a transaction so two concurrent callers create at most one row.
    pub async fn ensure_default(
        &self,
        kind: &str,
        blob: serde_json::Value,
        created_by: &str,
    ) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;
        let existing = sqlx::query("SELECT 1 FROM config_versions WHERE kind = ? AND is_active = 1")
            .bind(kind)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            tx.commit().await?;
            return Ok(());
        }

        let next_version: i64 = sqlx::query(
            "SELECT COALESCE(MAX(version), 0) + 1 AS v FROM config_versions WHERE kind = ?",
        )
        .bind(kind)
        .fetch_one(&mut *tx)
        .await?
        .try_get("v")?;

        sqlx::query(
            r#"
            INSERT INTO config_versions (kind, version, created_at, created_by, is_active, blob_json)
            VALUES (?, ?, ?, ?, 1, ?)
            "#,
        )
        .bind(kind)
        .bind(next_version)
        .bind(self.clock.now().to_rfc3339())
        .bind(created_by)
        .bind(serde_json::to_string(&blob)?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Reads a key from the flat overlay table.
    pub async fn get(&self, key: &str) -> StorageResult<Option<serde_json::Value>> {
        let row = sqlx::query("SELECT value_json FROM kv_overlay WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let raw: String = row.try_get("value_json")?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    /// Last-writer-wins set of a flat overlay key.
    pub async fn set(&self, key: &str, value: serde_json::Value) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_overlay (key, value_json, updated_at) VALUES (?, ?, ?)
            ON CONFLICT (key) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(serde_json::to_string(&value)?)
        .bind(self.clock.now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_config(row: sqlx::sqlite::SqliteRow) -> StorageResult<ConfigVersion> {
    let blob_json: String = row.try_get("blob_json")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(ConfigVersion {
        id: row.try_get("id")?,
        kind: row.try_get("kind")?,
        version: row.try_get("version")?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|t| t.with_timezone(&chrono::Utc))
            .map_err(|e| crate::error::StorageError::Database(sqlx::Error::Decode(Box::new(e))))?,
        created_by: row.try_get("created_by")?,
        is_active: row.try_get::<i64, _>("is_active")? != 0,
        blob: serde_json::from_str(&blob_json)?,
    })
}

#[cfg(test)]
#[path = "config_registry_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable run storage: the `runs_v2` summary row and the `run_state_v2`
//! working-state blob.

use crate::cursor::RunCursor;
use crate::error::{StorageError, StorageResult};
use av_core::{
    Clock, RunError, RunGraph, RunId, RunMode, RunState, RunStatus, RunSummary,
};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Clone)]
pub struct RunStore<C: Clock> {
    pool: SqlitePool,
    clock: C,
}

/// Filters accepted by `list_runs`. All fields are optional ANDed equality
/// filters.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub env: Option<String>,
    pub lane: Option<String>,
    pub status: Option<RunStatus>,
    pub requested_by: Option<String>,
}

fn status_str(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Queued => "queued",
        RunStatus::Running => "running",
        RunStatus::Succeeded => "succeeded",
        RunStatus::Failed => "failed",
        RunStatus::Blocked => "blocked",
        RunStatus::Canceled => "canceled",
    }
}

fn parse_status(raw: &str) -> RunStatus {
    match raw {
        "running" => RunStatus::Running,
        "succeeded" => RunStatus::Succeeded,
        "failed" => RunStatus::Failed,
        "blocked" => RunStatus::Blocked,
        "canceled" => RunStatus::Canceled,
        _ => RunStatus::Queued,
    }
}

fn mode_str(mode: RunMode) -> &'static str {
    match mode {
        RunMode::DryRun => "dry_run",
        RunMode::RealRun => "real_run",
    }
}

fn parse_mode(raw: &str) -> RunMode {
    match raw {
        "real_run" => RunMode::RealRun,
        _ => RunMode::DryRun,
    }
}

fn parse_ts(raw: &str) -> StorageResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(|e| StorageError::Database(sqlx::Error::Decode(Box::new(e))))?
        .with_timezone(&Utc))
}

impl<C: Clock> RunStore<C> {
    pub fn new(pool: SqlitePool, clock: C) -> Self {
        Self { pool, clock }
    }

    /// Validates the graph, assigns an opaque run id, and atomically inserts
    /// the `runs_v2` summary row and its initial `run_state_v2` blob.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_run(
        &self,
        env: &str,
        lane: &str,
        mode: RunMode,
        job_type: &str,
        requested_by: &str,
        run_graph: RunGraph,
        params: serde_json::Value,
        parent_run_id: Option<RunId>,
    ) -> StorageResult<RunId> {
        run_graph.validate()?;

        let run_id = RunId::new(Uuid::new_v4().to_string());
        let created_at = self.clock.now();

        let state = RunState {
            run_id: run_id.clone(),
            env: env.to_string(),
            lane: lane.to_string(),
            mode,
            job_type: job_type.to_string(),
            requested_by: requested_by.to_string(),
            parent_run_id: parent_run_id.clone(),
            schema_version: 2,
            status: RunStatus::Queued,
            run_graph: run_graph.clone(),
            params: params.clone(),
            step_states: Default::default(),
            artifacts: Default::default(),
            created_at,
            started_at: None,
            finished_at: None,
            last_error: None,
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO runs_v2 (
                run_id, schema_version, status, env, lane, mode, job_type,
                requested_by, parent_run_id, created_at, run_graph_json, params_json
            ) VALUES (?, 2, 'queued', ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(run_id.as_str())
        .bind(env)
        .bind(lane)
        .bind(mode_str(mode))
        .bind(job_type)
        .bind(requested_by)
        .bind(parent_run_id.as_ref().map(RunId::as_str))
        .bind(created_at.to_rfc3339())
        .bind(serde_json::to_string(&run_graph)?)
        .bind(serde_json::to_string(&params)?)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO run_state_v2 (run_id, state_json, updated_at) VALUES (?, ?, ?)",
        )
        .bind(run_id.as_str())
        .bind(serde_json::to_string(&state)?)
        .bind(created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(run_id)
    }

    pub async fn get_run_state(&self, run_id: &RunId) -> StorageResult<RunState> {
        let row = sqlx::query("SELECT state_json FROM run_state_v2 WHERE run_id = ?")
            .bind(run_id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::RunNotFound(run_id.clone()))?;
        let raw: String = row.try_get("state_json")?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Whole-blob replace; simultaneously updates the `runs_v2` summary
    /// columns, with `started_at` using COALESCE-first-nonnull semantics.
    pub async fn put_run_state(&self, state: &RunState) -> StorageResult<()> {
        let updated_at = self.clock.now().to_rfc3339();
        let last_error_json = match &state.last_error {
            Some(err) => Some(serde_json::to_string(err)?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query(
            "UPDATE run_state_v2 SET state_json = ?, updated_at = ? WHERE run_id = ?",
        )
        .bind(serde_json::to_string(state)?)
        .bind(&updated_at)
        .bind(state.run_id.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if rows == 0 {
            return Err(StorageError::RunNotFound(state.run_id.clone()));
        }

        sqlx::query(
            r#"
            UPDATE runs_v2
            SET status = ?,
                started_at = COALESCE(started_at, ?),
                finished_at = ?,
                last_error_json = ?
            WHERE run_id = ?
            "#,
        )
        .bind(status_str(state.status))
        .bind(state.started_at.map(|t| t.to_rfc3339()))
        .bind(state.finished_at.map(|t| t.to_rfc3339()))
        .bind(last_error_json)
        .bind(state.run_id.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_run_summary(&self, run_id: &RunId) -> StorageResult<RunSummary> {
        let row = sqlx::query(
            r#"
            SELECT run_id, env, lane, mode, job_type, requested_by, parent_run_id,
                   status, created_at, started_at, finished_at, last_error_json
            FROM runs_v2 WHERE run_id = ?
            "#,
        )
        .bind(run_id.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::RunNotFound(run_id.clone()))?;
        row_to_summary(&row)
    }

    /// Keyset-paginated listing ordered `created_at desc, run_id desc`.
    pub async fn list_runs(
        &self,
        filter: &RunFilter,
        limit: u32,
        cursor: Option<&RunCursor>,
    ) -> StorageResult<(Vec<RunSummary>, Option<RunCursor>)> {
        let mut sql = String::from(
            r#"
            SELECT run_id, env, lane, mode, job_type, requested_by, parent_run_id,
                   status, created_at, started_at, finished_at, last_error_json
            FROM runs_v2 WHERE 1 = 1
            "#,
        );
        if filter.env.is_some() {
            sql.push_str(" AND env = ?");
        }
        if filter.lane.is_some() {
            sql.push_str(" AND lane = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.requested_by.is_some() {
            sql.push_str(" AND requested_by = ?");
        }
        if cursor.is_some() {
            sql.push_str(" AND (created_at < ? OR (created_at = ? AND run_id < ?))");
        }
        sql.push_str(" ORDER BY created_at DESC, run_id DESC LIMIT ?");

        let mut query = sqlx::query(&sql);
        if let Some(env) = &filter.env {
            query = query.bind(env);
        }
        if let Some(lane) = &filter.lane {
            query = query.bind(lane);
        }
        if let Some(status) = filter.status {
            query = query.bind(status_str(status));
        }
        if let Some(requested_by) = &filter.requested_by {
            query = query.bind(requested_by);
        }
        if let Some(cursor) = cursor {
            let ts = cursor.created_at.to_rfc3339();
            query = query.bind(ts.clone()).bind(ts).bind(cursor.run_id.clone());
        }
        // fetch one extra row to know whether a next page exists
        query = query.bind(limit as i64 + 1);

        let rows = query.fetch_all(&self.pool).await?;
        let has_more = rows.len() > limit as usize;
        let mut summaries = Vec::with_capacity(limit as usize);
        for row in rows.into_iter().take(limit as usize) {
            summaries.push(row_to_summary(&row)?);
        }

        let next_cursor = if has_more {
            summaries.last().map(|s| RunCursor {
                created_at: s.created_at,
                run_id: s.run_id.as_str().to_string(),
            })
        } else {
            None
        };

        Ok((summaries, next_cursor))
    }

    /// Oldest-first by `created_at` among `queued`/`running` rows in the
    /// given lane — backs the scheduler's FIFO pick.
    pub async fn next_run_id(&self, env: &str, lane: &str) -> StorageResult<Option<RunId>> {
        let row = sqlx::query(
            r#"
            SELECT run_id FROM runs_v2
            WHERE env = ? AND lane = ? AND status IN ('queued', 'running')
            ORDER BY created_at ASC, run_id ASC
            LIMIT 1
            "#,
        )
        .bind(env)
        .bind(lane)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| RunId::new(r.get::<String, _>("run_id"))))
    }
}

fn row_to_summary(row: &sqlx::sqlite::SqliteRow) -> StorageResult<RunSummary> {
    let last_error_json: Option<String> = row.try_get("last_error_json")?;
    let last_error: Option<RunError> = match last_error_json {
        Some(raw) => Some(serde_json::from_str(&raw)?),
        None => None,
    };
    let started_at: Option<String> = row.try_get("started_at")?;
    let finished_at: Option<String> = row.try_get("finished_at")?;
    let parent_run_id: Option<String> = row.try_get("parent_run_id")?;

    Ok(RunSummary {
        run_id: RunId::new(row.try_get::<String, _>("run_id")?),
        env: row.try_get("env")?,
        lane: row.try_get("lane")?,
        mode: parse_mode(&row.try_get::<String, _>("mode")?),
        job_type: row.try_get("job_type")?,
        requested_by: row.try_get("requested_by")?,
        parent_run_id: parent_run_id.map(RunId::new),
        status: parse_status(&row.try_get::<String, _>("status")?),
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
        started_at: started_at.map(|s| parse_ts(&s)).transpose()?,
        finished_at: finished_at.map(|s| parse_ts(&s)).transpose()?,
        last_error,
    })
}

#[cfg(test)]
#[path = "run_store_tests.rs"]
mod tests;

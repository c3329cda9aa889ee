// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run ordered, append-only event log with best-effort in-process live
//! fan-out.

use crate::cursor::EventCursor;
use crate::error::StorageResult;
use av_core::{Clock, EventType, RunEvent, RunId};
use parking_lot::Mutex;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

const LIVE_CHANNEL_CAPACITY: usize = 256;

fn event_type_str(event_type: EventType) -> &'static str {
    match event_type {
        EventType::RunStarted => "RUN_STARTED",
        EventType::RunSucceeded => "RUN_SUCCEEDED",
        EventType::RunBlocked => "RUN_BLOCKED",
        EventType::StepStarted => "STEP_STARTED",
        EventType::StepSucceeded => "STEP_SUCCEEDED",
        EventType::StepFailed => "STEP_FAILED",
        EventType::WorkerV2TickRequested => "WORKER_V2_TICK_REQUESTED",
    }
}

fn parse_event_type(raw: &str) -> EventType {
    match raw {
        "RUN_SUCCEEDED" => EventType::RunSucceeded,
        "RUN_BLOCKED" => EventType::RunBlocked,
        "STEP_STARTED" => EventType::StepStarted,
        "STEP_SUCCEEDED" => EventType::StepSucceeded,
        "STEP_FAILED" => EventType::StepFailed,
        "WORKER_V2_TICK_REQUESTED" => EventType::WorkerV2TickRequested,
        _ => EventType::RunStarted,
    }
}

#[derive(Clone)]
pub struct EventBus<C: Clock> {
    pool: SqlitePool,
    clock: C,
    live: Arc<Mutex<HashMap<String, broadcast::Sender<RunEvent>>>>,
}

impl<C: Clock> EventBus<C> {
    pub fn new(pool: SqlitePool, clock: C) -> Self {
        Self {
            pool,
            clock,
            live: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Persists the event, then best-effort delivers it to any live
    /// subscriber. Persistence always happens first; a missing/lagged
    /// subscriber never fails the publish.
    pub async fn publish(
        &self,
        run_id: &RunId,
        event_type: EventType,
        payload: serde_json::Value,
    ) -> StorageResult<RunEvent> {
        let ts = self.clock.now();
        let payload_json = serde_json::to_string(&payload)?;

        let id = sqlx::query(
            "INSERT INTO run_events_v2 (run_id, ts, event_type, payload_json) VALUES (?, ?, ?, ?)",
        )
        .bind(run_id.as_str())
        .bind(ts.to_rfc3339())
        .bind(event_type_str(event_type))
        .bind(&payload_json)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        let event = RunEvent {
            id,
            run_id: run_id.clone(),
            ts,
            event_type,
            payload,
        };

        if let Some(sender) = self.live.lock().get(run_id.as_str()) {
            // A full/closed channel is not an error for the publisher.
            let _ = sender.send(event.clone());
        }

        Ok(event)
    }

    /// Returns up to `limit` events for `run_id`, ordered `(ts asc, id asc)`.
    pub async fn replay(&self, run_id: &RunId, limit: u32) -> StorageResult<Vec<RunEvent>> {
        let (events, _) = self.replay_page(run_id, limit, None).await?;
        Ok(events)
    }

    /// Cursor-paginated variant used by the HTTP events endpoint.
    pub async fn replay_page(
        &self,
        run_id: &RunId,
        limit: u32,
        cursor: Option<&EventCursor>,
    ) -> StorageResult<(Vec<RunEvent>, Option<EventCursor>)> {
        let mut sql = String::from(
            "SELECT id, run_id, ts, event_type, payload_json FROM run_events_v2 WHERE run_id = ?",
        );
        if cursor.is_some() {
            sql.push_str(" AND (ts > ? OR (ts = ? AND id > ?))");
        }
        sql.push_str(" ORDER BY ts ASC, id ASC LIMIT ?");

        let mut query = sqlx::query(&sql).bind(run_id.as_str());
        if let Some(cursor) = cursor {
            let ts = cursor.ts.to_rfc3339();
            query = query.bind(ts.clone()).bind(ts).bind(cursor.id);
        }
        query = query.bind(limit as i64 + 1);

        let rows = query.fetch_all(&self.pool).await?;
        let has_more = rows.len() > limit as usize;
        let mut events = Vec::with_capacity(limit as usize);
        for row in rows.into_iter().take(limit as usize) {
            events.push(row_to_event(&row)?);
        }

        let next_cursor = if has_more {
            events.last().map(|e| EventCursor { ts: e.ts, id: e.id })
        } else {
            None
        };

        Ok((events, next_cursor))
    }

    /// Subscribes to live events for `run_id`. The channel is created lazily
    /// on first subscriber and torn down once the last subscriber and
    /// publisher drop it.
    pub fn subscribe(&self, run_id: &RunId) -> BroadcastStream<RunEvent> {
        let mut live = self.live.lock();
        let sender = live
            .entry(run_id.as_str().to_string())
            .or_insert_with(|| broadcast::channel(LIVE_CHANNEL_CAPACITY).0);
        BroadcastStream::new(sender.subscribe())
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> StorageResult<RunEvent> {
    let id: i64 = row.try_get("id")?;
    let run_id: String = row.try_get("run_id")?;
    let ts: String = row.try_get("ts")?;
    let event_type: String = row.try_get("event_type")?;
    let payload_json: String = row.try_get("payload_json")?;
    Ok(RunEvent {
        id,
        run_id: RunId::new(run_id),
        ts: chrono::DateTime::parse_from_rfc3339(&ts)
            .map_err(|e| crate::error::StorageError::Database(sqlx::Error::Decode(Box::new(e))))?
            .with_timezone(&chrono::Utc),
        event_type: parse_event_type(&event_type),
        payload: serde_json::from_str(&payload_json)?,
    })
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;

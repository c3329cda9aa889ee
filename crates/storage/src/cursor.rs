// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque keyset-pagination cursors, encoded as `"<field1>|<field2>"` strings.

use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};

/// Cursor for `list_runs`: `created_at|run_id`, ordered `created_at desc, run_id desc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCursor {
    pub created_at: DateTime<Utc>,
    pub run_id: String,
}

impl RunCursor {
    pub fn encode(&self) -> String {
        format!("{}|{}", self.created_at.to_rfc3339(), self.run_id)
    }

    pub fn decode(raw: &str) -> StorageResult<Self> {
        let (ts, run_id) = raw.split_once('|').ok_or(StorageError::InvalidCursor)?;
        let created_at = DateTime::parse_from_rfc3339(ts)
            .map_err(|_| StorageError::InvalidCursor)?
            .with_timezone(&Utc);
        if run_id.is_empty() {
            return Err(StorageError::InvalidCursor);
        }
        Ok(Self {
            created_at,
            run_id: run_id.to_string(),
        })
    }
}

/// Cursor for `replay_page`: `ts|id`, ordered `ts asc, id asc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCursor {
    pub ts: DateTime<Utc>,
    pub id: i64,
}

impl EventCursor {
    pub fn encode(&self) -> String {
        format!("{}|{}", self.ts.to_rfc3339(), self.id)
    }

    pub fn decode(raw: &str) -> StorageResult<Self> {
        let (ts, id) = raw.split_once('|').ok_or(StorageError::InvalidCursor)?;
        let ts = DateTime::parse_from_rfc3339(ts)
            .map_err(|_| StorageError::InvalidCursor)?
            .with_timezone(&Utc);
        let id: i64 = id.parse().map_err(|_| StorageError::InvalidCursor)?;
        Ok(Self { ts, id })
    }
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;

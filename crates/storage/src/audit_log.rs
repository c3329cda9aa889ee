// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only operator/action audit log. Every payload and error value is
//! filtered of secret-shaped keys before it is persisted.

use crate::error::StorageResult;
use av_core::{AuditResult, Clock};
use sqlx::SqlitePool;

const SECRET_MARKERS: &[&str] = &["token", "password", "secret", "key"];

/// Recursively strips object keys whose lowercased name contains any of
/// `token|password|secret|key`, replacing the value with a redaction marker.
pub fn filter_secrets(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut filtered = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let lowered = k.to_lowercase();
                if SECRET_MARKERS.iter().any(|m| lowered.contains(m)) {
                    filtered.insert(k.clone(), serde_json::Value::String("[redacted]".into()));
                } else {
                    filtered.insert(k.clone(), filter_secrets(v));
                }
            }
            serde_json::Value::Object(filtered)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(filter_secrets).collect())
        }
        other => other.clone(),
    }
}

#[derive(Clone)]
pub struct AuditLog<C: Clock> {
    pool: SqlitePool,
    clock: C,
}

impl<C: Clock> AuditLog<C> {
    pub fn new(pool: SqlitePool, clock: C) -> Self {
        Self { pool, clock }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        &self,
        actor_id: Option<&str>,
        actor_role: Option<&str>,
        action: &str,
        target_id: Option<&str>,
        result: AuditResult,
        payload: Option<serde_json::Value>,
        error: Option<serde_json::Value>,
    ) -> StorageResult<()> {
        let result_str = match result {
            AuditResult::Success => "success",
            AuditResult::Idle => "idle",
            AuditResult::Denied => "denied",
            AuditResult::Error => "error",
        };
        let payload = payload.as_ref().map(filter_secrets);
        let error = error.as_ref().map(filter_secrets);

        sqlx::query(
            r#"
            INSERT INTO audit_log (ts, actor_id, actor_role, action, target_id, result, payload_json, error_json)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(self.clock.now().to_rfc3339())
        .bind(actor_id)
        .bind(actor_role)
        .bind(action)
        .bind(target_id)
        .bind(result_str)
        .bind(payload.map(|p| p.to_string()))
        .bind(error.map(|e| e.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "audit_log_tests.rs"]
mod tests;

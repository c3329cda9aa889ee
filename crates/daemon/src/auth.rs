// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin-token gate for mutating endpoints, grounded in
//! `api_v2.py`'s `verify_admin_token`.

use crate::error::ApiError;
use crate::state::AppState;
use av_core::AuditResult;
use axum::http::HeaderMap;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Verifies the `X-Admin-Token` header (header names are already
/// case-insensitive under `HeaderMap`) against the configured admin token.
/// Writes a `admin_auth`/`denied` audit row on any failure; a failed audit
/// write is itself only logged, never propagated.
pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if state.config.admin_token.is_empty() {
        audit_denied(state, "ADMIN_TOKEN_NOT_CONFIGURED").await;
        return Err(ApiError::AdminTokenNotConfigured);
    }

    let presented = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if presented != state.config.admin_token {
        audit_denied(state, "INVALID_ADMIN_TOKEN").await;
        return Err(ApiError::InvalidAdminToken);
    }

    Ok(())
}

async fn audit_denied(state: &AppState, error_code: &str) {
    if let Err(e) = state
        .audit_log
        .record(
            None,
            None,
            "admin_auth",
            None,
            AuditResult::Denied,
            None,
            Some(serde_json::json!({"code": error_code})),
        )
        .await
    {
        tracing::error!(error = %e, "failed to write admin_auth audit row");
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;

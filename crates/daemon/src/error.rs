// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP error envelope: `{"error": {"code", "message", "detail"?}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid cursor")]
    InvalidCursor,
    #[error("invalid admin token")]
    InvalidAdminToken,
    #[error("admin token not configured")]
    AdminTokenNotConfigured,
    #[error("storage error: {0}")]
    Storage(#[from] av_storage::StorageError),
    #[error("engine error: {0}")]
    Engine(#[from] av_engine::EngineError),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "INVALID_REQUEST",
            ApiError::InvalidCursor => "INVALID_CURSOR",
            ApiError::InvalidAdminToken => "INVALID_ADMIN_TOKEN",
            ApiError::AdminTokenNotConfigured => "ADMIN_TOKEN_NOT_CONFIGURED",
            ApiError::Storage(av_storage::StorageError::RunNotFound(_)) => "RUN_NOT_FOUND",
            ApiError::Storage(av_storage::StorageError::InvalidCursor) => "INVALID_CURSOR",
            ApiError::Storage(_) => "INTERNAL_ERROR",
            ApiError::Engine(av_engine::EngineError::CapReached) => "INTERNAL_ERROR",
            ApiError::Engine(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCursor => StatusCode::BAD_REQUEST,
            ApiError::InvalidAdminToken => StatusCode::FORBIDDEN,
            ApiError::AdminTokenNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Storage(av_storage::StorageError::RunNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(av_storage::StorageError::InvalidCursor) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, ApiError::Storage(_) | ApiError::Engine(_)) {
            tracing::error!(error = %self, "request failed");
        }
        let status = self.status();
        let code = self.code();
        let message = self.to_string();
        (
            status,
            Json(ErrorBody {
                error: ErrorDetail {
                    code,
                    message,
                    detail: None,
                },
            }),
        )
            .into_response()
    }
}

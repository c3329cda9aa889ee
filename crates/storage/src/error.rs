// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage-layer error type.

use av_core::RunId;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("run {0} not found")]
    RunNotFound(RunId),

    #[error("run graph is invalid: {0}")]
    InvalidGraph(#[from] av_core::GraphError),

    #[error("malformed pagination cursor")]
    InvalidCursor,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("failed to (de)serialize stored json: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

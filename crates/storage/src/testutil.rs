// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test fixtures: an in-memory migrated SQLite pool.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// A single-connection in-memory pool. SQLite's `:memory:` database is
/// per-connection, so the pool is capped at 1 to keep every query against the
/// same database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

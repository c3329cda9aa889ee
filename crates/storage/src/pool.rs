// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection pool setup and embedded migrations for the `FORGE_DB_PATH`
//! SQLite database.

use crate::error::StorageResult;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Opens (creating if absent) the SQLite database at `path` and returns a
/// pool sized for a handful of concurrent connections — SQLite itself
/// serializes writers, so a large pool buys nothing.
pub async fn connect(path: &str) -> StorageResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Runs the embedded schema migrations. Idempotent.
pub async fn migrate(pool: &SqlitePool) -> StorageResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

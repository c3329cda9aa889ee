// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Direct-to-store wiring shared by every subcommand: the CLI talks to
//! `av-storage`/`av-engine` directly against `FORGE_DB_PATH`, the same way
//! the daemon does, rather than going over HTTP.

use anyhow::{Context, Result};
use av_core::SystemClock;
use av_engine::{AllowAllPolicy, GraphTicker, Scheduler, Worker};
use av_storage::{AuditLog, ConfigRegistry, EventBus, RunStore};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct App {
    pub pool: SqlitePool,
    pub run_store: RunStore<SystemClock>,
    pub event_bus: EventBus<SystemClock>,
    pub config_registry: ConfigRegistry<SystemClock>,
    pub audit_log: AuditLog<SystemClock>,
    pub worker: Worker<SystemClock>,
}

impl App {
    pub async fn connect() -> Result<Self> {
        let db_path = std::env::var("FORGE_DB_PATH")
            .context("FORGE_DB_PATH must be set (path to the Autonomy V2 SQLite database)")?;
        let pool = av_storage::connect(&db_path)
            .await
            .with_context(|| format!("failed to open database at {db_path}"))?;
        av_storage::migrate(&pool).await.context("failed to run migrations")?;

        let clock = SystemClock;
        let run_store = RunStore::new(pool.clone(), clock.clone());
        let event_bus = EventBus::new(pool.clone(), clock.clone());
        let lease_store = av_storage::LeaseStore::new(pool.clone(), clock.clone());
        let config_registry = ConfigRegistry::new(pool.clone(), clock.clone());
        let audit_log = AuditLog::new(pool.clone(), clock.clone());
        let scheduler = Scheduler::new(run_store.clone());
        let ticker = GraphTicker::new(
            run_store.clone(),
            event_bus.clone(),
            clock,
            Some(Arc::new(AllowAllPolicy)),
            None,
        );
        let worker = Worker::new(scheduler, lease_store, ticker, event_bus.clone());

        Ok(Self {
            pool,
            run_store,
            event_bus,
            config_registry,
            audit_log,
            worker,
        })
    }
}

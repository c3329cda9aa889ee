// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state: a single explicit wiring of every storage and
//! engine component, passed into handlers and the background loop as
//! `Arc<AppState>`.

use crate::config::Config;
use av_core::SystemClock;
use av_engine::{AllowAllPolicy, GraphTicker, Scheduler, Worker};
use av_storage::{AuditLog, ConfigRegistry, EventBus, LeaseStore, RunStore};
use sqlx::SqlitePool;
use std::sync::Arc;

pub const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BUILD_SERVICE: &str = "av-daemon";

pub struct AppState {
    pub config: Config,
    pub pool: SqlitePool,
    pub run_store: RunStore<SystemClock>,
    pub event_bus: EventBus<SystemClock>,
    pub lease_store: LeaseStore<SystemClock>,
    pub config_registry: ConfigRegistry<SystemClock>,
    pub audit_log: AuditLog<SystemClock>,
    pub scheduler: Scheduler<SystemClock>,
    pub worker: Worker<SystemClock>,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let clock = SystemClock;
        let run_store = RunStore::new(pool.clone(), clock.clone());
        let event_bus = EventBus::new(pool.clone(), clock.clone());
        let lease_store = LeaseStore::new(pool.clone(), clock.clone());
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
        let worker = Worker::new(scheduler.clone(), lease_store.clone(), ticker, event_bus.clone());

        Self {
            config,
            pool,
            run_store,
            event_bus,
            lease_store,
            config_registry,
            audit_log,
            scheduler,
            worker,
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Autonomy V2 daemon entry point.
//!
//! Thin by design: loads configuration, wires `AppState`, conditionally
//! spawns the background worker loop behind the worker guard, and serves the
//! HTTP control plane built in `routes.rs`.

use std::sync::Arc;

use av_daemon::{routes, state::AppState, Config};
use av_engine::{background_owner_id, can_start_worker, mark_started_once, run_background_loop};
use av_storage::KillSwitch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Dev convenience only; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let config = Config::from_env()?;
    let pool = av_storage::connect(&config.db_path).await?;
    av_storage::migrate(&pool).await?;

    let kill_switch_registry = av_storage::ConfigRegistry::new(pool.clone(), av_core::SystemClock);
    KillSwitch::new(&kill_switch_registry).ensure_default().await?;

    let state = Arc::new(AppState::new(config.clone(), pool));

    maybe_spawn_background_worker(&config, &state);

    let app = routes::build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!(addr = %config.http_addr, "av-daemon listening");
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn maybe_spawn_background_worker(config: &Config, state: &Arc<AppState>) {
    let pid = std::process::id();
    let guard = can_start_worker(config.worker_enabled, config.worker_pid, pid);
    if !guard.enabled {
        info!(reason = %guard.reason, "background worker not started");
        return;
    }
    if !mark_started_once() {
        warn!("background worker already started in this process, refusing to spawn a second loop");
        return;
    }

    let worker = state.worker.clone();
    let owner_id = background_owner_id(pid);
    let env = config.worker_env.clone();
    let lane = config.worker_lane.clone();
    let tick_interval_seconds = config.worker_tick_interval_seconds;
    let config_registry = state.config_registry.clone();

    info!(%env, %lane, tick_interval_seconds, "starting background worker loop");
    tokio::spawn(run_background_loop(
        worker,
        env,
        lane,
        owner_id,
        tick_interval_seconds,
        config_registry,
    ));
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

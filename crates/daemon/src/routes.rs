// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Axum router and handlers for the `/api/autonomy/v2` control surface,
//! grounded in `original_source/forge/autonomy/api_v2.py`'s route shapes.

use crate::auth::require_admin;
use crate::error::ApiError;
use crate::state::{AppState, BUILD_SERVICE, BUILD_VERSION};
use av_core::{AuditResult, RunGraph, RunId, RunMode, SchedulerCaps};
use av_engine::can_start_worker;
use av_storage::{EventCursor, KillSwitch, RunCursor, RunFilter};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    let v2 = Router::new()
        .route("/runs", post(create_run).get(list_runs))
        .route("/runs/:run_id", get(get_run))
        .route("/runs/:run_id/events", get(get_run_events))
        .route("/worker/status", get(worker_status))
        .route("/worker/tick_once", post(worker_tick_once))
        .route("/kill_switch/lane", post(set_kill_switch_lane));

    Router::new()
        .nest("/api/autonomy/v2", v2)
        .route("/api/health", get(health))
        .with_state(state)
}

#[derive(Deserialize)]
struct CreateRunRequest {
    env: String,
    lane: String,
    mode: RunMode,
    job_type: String,
    requested_by: String,
    run_graph: RunGraph,
    #[serde(default)]
    params: Option<serde_json::Value>,
    #[serde(default)]
    parent_run_id: Option<RunId>,
}

#[derive(Serialize)]
struct CreateRunResponse {
    run_id: RunId,
    status: &'static str,
}

async fn create_run(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRunRequest>,
) -> Result<Json<CreateRunResponse>, ApiError> {
    let run_id = state
        .run_store
        .create_run(
            &body.env,
            &body.lane,
            body.mode,
            &body.job_type,
            &body.requested_by,
            body.run_graph,
            body.params.unwrap_or(serde_json::json!({})),
            body.parent_run_id,
        )
        .await?;
    Ok(Json(CreateRunResponse {
        run_id,
        status: "created",
    }))
}

#[derive(Deserialize)]
struct ListRunsQuery {
    env: Option<String>,
    lane: Option<String>,
    status: Option<String>,
    requested_by: Option<String>,
    limit: Option<u32>,
    cursor: Option<String>,
}

#[derive(Serialize)]
struct ListRunsResponse {
    items: Vec<av_core::RunSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRunsQuery>,
) -> Result<Json<ListRunsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(50);
    if limit == 0 || limit > 200 {
        return Err(ApiError::InvalidRequest("limit must be in 1..=200".into()));
    }
    let cursor = query
        .cursor
        .map(|c| RunCursor::decode(&c))
        .transpose()
        .map_err(|_| ApiError::InvalidCursor)?;

    let filter = RunFilter {
        env: query.env,
        lane: query.lane,
        status: query.status.as_deref().map(parse_run_status).transpose()?,
        requested_by: query.requested_by,
    };

    let (items, next) = state.run_store.list_runs(&filter, limit, cursor.as_ref()).await?;
    Ok(Json(ListRunsResponse {
        items,
        next_cursor: next.map(|c| c.encode()),
    }))
}

fn parse_run_status(raw: &str) -> Result<av_core::RunStatus, ApiError> {
    match raw {
        "queued" => Ok(av_core::RunStatus::Queued),
        "running" => Ok(av_core::RunStatus::Running),
        "succeeded" => Ok(av_core::RunStatus::Succeeded),
        "failed" => Ok(av_core::RunStatus::Failed),
        "blocked" => Ok(av_core::RunStatus::Blocked),
        "canceled" => Ok(av_core::RunStatus::Canceled),
        other => Err(ApiError::InvalidRequest(format!("unknown status '{other}'"))),
    }
}

async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<Json<av_core::RunState>, ApiError> {
    let run_id = RunId::new(run_id);
    let run_state = state.run_store.get_run_state(&run_id).await?;
    Ok(Json(run_state))
}

#[derive(Deserialize)]
struct EventsQuery {
    limit: Option<u32>,
    cursor: Option<String>,
}

#[derive(Serialize)]
struct EventsResponse {
    items: Vec<av_core::RunEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

async fn get_run_events(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    let run_id = RunId::new(run_id);
    // Existence check so an absent run yields 404 rather than an empty page.
    state.run_store.get_run_summary(&run_id).await?;

    let limit = query.limit.unwrap_or(200);
    if limit == 0 || limit > 500 {
        return Err(ApiError::InvalidRequest("limit must be in 1..=500".into()));
    }
    let cursor = query
        .cursor
        .map(|c| EventCursor::decode(&c))
        .transpose()
        .map_err(|_| ApiError::InvalidCursor)?;

    let (items, next) = state
        .event_bus
        .replay_page(&run_id, limit, cursor.as_ref())
        .await?;
    Ok(Json(EventsResponse {
        items,
        next_cursor: next.map(|c| c.encode()),
    }))
}

/// `ConfigRegistry::get`/`get_active` are silent-`None` shims for missing
/// configs everywhere else; this endpoint is the one place that surfaces the
/// absence explicitly rather than staying silent end-to-end.
#[derive(Serialize)]
struct WorkerConfigStatus {
    kill_switch_v2: bool,
}

#[derive(Serialize)]
struct KillSwitchStatus {
    env: String,
    lane: String,
    lane_enabled: bool,
}

#[derive(Serialize)]
struct WorkerCounts {
    running: i64,
    queued: i64,
}

#[derive(Serialize)]
struct WorkerStatusResponse {
    guard: av_engine::WorkerGuardStatus,
    config: WorkerConfigStatus,
    // No named per-job-type policy is wired into the daemon today; the
    // ticker runs under `AllowAllPolicy` only, so this stays `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    policy: Option<String>,
    kill_switch: KillSwitchStatus,
    worker: WorkerCounts,
}

async fn worker_status(State(state): State<Arc<AppState>>) -> Result<Json<WorkerStatusResponse>, ApiError> {
    let env = &state.config.worker_env;
    let lane = &state.config.worker_lane;
    let filter_running = RunFilter {
        env: Some(env.clone()),
        lane: Some(lane.clone()),
        status: Some(av_core::RunStatus::Running),
        requested_by: None,
    };
    let filter_queued = RunFilter {
        status: Some(av_core::RunStatus::Queued),
        ..filter_running.clone()
    };
    let (running_rows, _) = state.run_store.list_runs(&filter_running, 200, None).await?;
    let (queued_rows, _) = state.run_store.list_runs(&filter_queued, 200, None).await?;

    let kill_switch_v2_present = state
        .config_registry
        .get_active(av_storage::KILL_SWITCH_KIND)
        .await?
        .is_some();

    let kill_switch = KillSwitch::new(&state.config_registry);
    let lane_enabled = kill_switch.lane_enabled(env, lane).await?;
    let guard = can_start_worker(state.config.worker_enabled, state.config.worker_pid, std::process::id());

    Ok(Json(WorkerStatusResponse {
        guard,
        config: WorkerConfigStatus {
            kill_switch_v2: kill_switch_v2_present,
        },
        policy: None,
        kill_switch: KillSwitchStatus {
            env: env.clone(),
            lane: lane.clone(),
            lane_enabled,
        },
        worker: WorkerCounts {
            running: running_rows.len() as i64,
            queued: queued_rows.len() as i64,
        },
    }))
}

#[derive(Deserialize)]
struct TickOnceRequest {
    env: String,
    lane: String,
    owner_id: String,
    #[serde(default)]
    caps: Option<SchedulerCaps>,
}

#[derive(Serialize)]
struct TickOnceResponse {
    status: &'static str,
    ticked_runs: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

async fn worker_tick_once(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TickOnceRequest>,
) -> Result<Json<TickOnceResponse>, ApiError> {
    require_admin(&state, &headers).await?;

    let caps = body.caps.unwrap_or_else(|| SchedulerCaps::new(1));
    let kill_switch = KillSwitch::new(&state.config_registry);

    let result = state
        .worker
        .tick_once(
            &body.env,
            &body.lane,
            &body.owner_id,
            caps,
            chrono::Duration::seconds(15),
            &kill_switch,
        )
        .await;

    match result {
        Ok(summary) => {
            let audit_result = if summary.runs_ticked > 0 {
                AuditResult::Success
            } else {
                AuditResult::Idle
            };
            audit_tick(&state, audit_result, &body, None).await;
            let status = if summary.runs_ticked > 0 { "success" } else { "idle" };
            Ok(Json(TickOnceResponse {
                status,
                ticked_runs: summary.runs_ticked,
                reason: None,
            }))
        }
        Err(e) => {
            audit_tick(&state, AuditResult::Error, &body, Some(e.to_string())).await;
            Err(ApiError::Engine(e))
        }
    }
}

async fn audit_tick(state: &AppState, result: AuditResult, body: &TickOnceRequest, error: Option<String>) {
    let payload = serde_json::json!({"env": body.env, "lane": body.lane, "owner_id": body.owner_id});
    let error = error.map(|e| serde_json::json!({"message": e}));
    if let Err(e) = state
        .audit_log
        .record(Some(&body.owner_id), Some("worker"), "tick_once", None, result, Some(payload), error)
        .await
    {
        tracing::error!(error = %e, "failed to write tick_once audit row");
    }
}

#[derive(Deserialize)]
struct KillSwitchLaneRequest {
    env: String,
    lane: String,
    enabled: bool,
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
}

async fn set_kill_switch_lane(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<KillSwitchLaneRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    require_admin(&state, &headers).await?;

    let kill_switch = KillSwitch::new(&state.config_registry);
    let outcome = kill_switch.set_lane_enabled(&body.env, &body.lane, body.enabled).await;

    let payload = serde_json::json!({"env": body.env, "lane": body.lane, "enabled": body.enabled});
    match &outcome {
        Ok(()) => {
            if let Err(e) = state
                .audit_log
                .record(None, Some("admin"), "kill_switch_lane", None, AuditResult::Success, Some(payload), None)
                .await
            {
                tracing::error!(error = %e, "failed to write kill_switch_lane audit row");
            }
        }
        Err(e) => {
            let error = serde_json::json!({"message": e.to_string()});
            if let Err(audit_err) = state
                .audit_log
                .record(None, Some("admin"), "kill_switch_lane", None, AuditResult::Error, Some(payload), Some(error))
                .await
            {
                tracing::error!(error = %audit_err, "failed to write kill_switch_lane audit row");
            }
        }
    }

    outcome?;
    Ok(Json(OkResponse { ok: true }))
}

#[derive(Serialize)]
struct HealthResponse {
    service: &'static str,
    version: &'static str,
    db_path: String,
    admin_token_configured: bool,
    autonomy_v2_worker: WorkerHealth,
}

#[derive(Serialize)]
struct WorkerHealth {
    enabled: bool,
    reason: String,
    pid: u32,
    configured_pid: u32,
    tick_interval_seconds: u64,
    env: String,
    lane: String,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let guard = can_start_worker(state.config.worker_enabled, state.config.worker_pid, std::process::id());
    Json(HealthResponse {
        service: BUILD_SERVICE,
        version: BUILD_VERSION,
        db_path: state.config.db_path.clone(),
        admin_token_configured: !state.config.admin_token.is_empty(),
        autonomy_v2_worker: WorkerHealth {
            enabled: guard.enabled,
            reason: guard.reason,
            pid: guard.pid,
            configured_pid: guard.configured_pid,
            tick_interval_seconds: state.config.worker_tick_interval_seconds,
            env: state.config.worker_env.clone(),
            lane: state.config.worker_lane.clone(),
        },
    })
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;

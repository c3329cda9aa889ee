// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run, graph, event, lease, config, and audit data types shared by the
//! storage and engine layers.

use crate::define_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

define_id! {
    /// Opaque server-assigned identifier for a run.
    pub struct RunId;
}

define_id! {
    /// Identifier for a single step within a run graph, unique within that graph.
    pub struct StepId;
}

/// Execution mode a run was created under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    DryRun,
    RealRun,
}

/// Lifecycle status of a run. `Succeeded`, `Failed`, `Blocked`, and `Canceled`
/// are terminal: once reached, a run's status never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Blocked,
    Canceled,
}

impl RunStatus {
    /// Terminal statuses are absorbing: `tick_run` never leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Blocked | RunStatus::Canceled
        )
    }
}

/// Status of an individual step within a run's state blob. Steps with no
/// entry in `step_states` are implicitly pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed,
}

/// A single node in a run graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDef {
    pub id: StepId,
    #[serde(default)]
    pub deps: Vec<StepId>,
    pub kind: String,
}

/// The immutable DAG embedded in a run at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunGraph {
    pub entry_step: StepId,
    pub steps: BTreeMap<StepId, StepDef>,
}

/// Errors detected while validating a run graph at `create_run` time.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("entry_step {0} is not present in steps")]
    MissingEntryStep(StepId),
    #[error("step {step} depends on unknown step {dep}")]
    UnknownDependency { step: StepId, dep: StepId },
    #[error("run graph contains a cycle involving step {0}")]
    Cycle(StepId),
}

impl RunGraph {
    /// Validates acyclicity, dependency resolution, and entry-step presence.
    /// Called once at `create_run` time; an invalid graph is rejected before
    /// any row is written.
    pub fn validate(&self) -> Result<(), GraphError> {
        if !self.steps.contains_key(&self.entry_step) {
            return Err(GraphError::MissingEntryStep(self.entry_step.clone()));
        }
        for (id, def) in &self.steps {
            for dep in &def.deps {
                if !self.steps.contains_key(dep) {
                    return Err(GraphError::UnknownDependency {
                        step: id.clone(),
                        dep: dep.clone(),
                    });
                }
            }
        }
        self.check_acyclic()
    }

    fn check_acyclic(&self) -> Result<(), GraphError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: BTreeMap<&StepId, Mark> = BTreeMap::new();

        fn visit<'a>(
            id: &'a StepId,
            steps: &'a BTreeMap<StepId, StepDef>,
            marks: &mut BTreeMap<&'a StepId, Mark>,
        ) -> Result<(), GraphError> {
            match marks.get(id) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => return Err(GraphError::Cycle(id.clone())),
                None => {}
            }
            marks.insert(id, Mark::Visiting);
            if let Some(def) = steps.get(id) {
                for dep in &def.deps {
                    visit(dep, steps, marks)?;
                }
            }
            marks.insert(id, Mark::Done);
            Ok(())
        }

        for id in self.steps.keys() {
            visit(id, &self.steps, &mut marks)?;
        }
        Ok(())
    }

    /// The deterministic step-selection order: `entry_step` first (if it is a
    /// step id, which `validate` guarantees), then all remaining step ids in
    /// lexicographic ascending order, deduplicated.
    pub fn selection_order(&self) -> Vec<StepId> {
        let mut ordered = Vec::with_capacity(self.steps.len());
        ordered.push(self.entry_step.clone());
        for id in self.steps.keys() {
            if *id != self.entry_step {
                ordered.push(id.clone());
            }
        }
        ordered
    }
}

/// A structured failure recorded on a run when it stops short of success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub stage: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<StepId>,
}

/// Per-step runtime status, stored in the state blob's `step_states` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepState {
    pub status: StepStatus,
    pub updated_at: DateTime<Utc>,
}

/// The full authoritative working state of a run, owned one-to-one by the
/// run row. Updates are whole-blob replace-with-timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: RunId,
    pub env: String,
    pub lane: String,
    pub mode: RunMode,
    pub job_type: String,
    pub requested_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<RunId>,
    pub schema_version: u32,
    pub status: RunStatus,
    pub run_graph: RunGraph,
    pub params: serde_json::Value,
    #[serde(default)]
    pub step_states: BTreeMap<StepId, StepState>,
    #[serde(default)]
    pub artifacts: BTreeMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RunError>,
}

impl RunState {
    /// The step this run would act on next, per the deterministic selection
    /// rule in the graph ticker: first entry (in `selection_order`) whose own
    /// state is not `succeeded` and whose every dependency has succeeded.
    pub fn next_runnable_step(&self) -> Option<&StepDef> {
        self.run_graph.selection_order().into_iter().find_map(|id| {
            let def = self.run_graph.steps.get(&id)?;
            let already_done = matches!(
                self.step_states.get(&id),
                Some(StepState {
                    status: StepStatus::Succeeded,
                    ..
                })
            );
            if already_done {
                return None;
            }
            let deps_ready = def.deps.iter().all(|dep| {
                matches!(
                    self.step_states.get(dep),
                    Some(StepState {
                        status: StepStatus::Succeeded,
                        ..
                    })
                )
            });
            deps_ready.then_some(def)
        })
    }
}

/// Summary row shown by list/get endpoints without materializing the full
/// state blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub env: String,
    pub lane: String,
    pub mode: RunMode,
    pub job_type: String,
    pub requested_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<RunId>,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RunError>,
}

/// Event types published to the per-run event log. New variants must only be
/// added, never renamed or removed: unknown values are ignored by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    RunStarted,
    RunSucceeded,
    RunBlocked,
    StepStarted,
    StepSucceeded,
    StepFailed,
    WorkerV2TickRequested,
}

/// A single row in a run's append-only event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub id: i64,
    pub run_id: RunId,
    pub ts: DateTime<Utc>,
    pub event_type: EventType,
    pub payload: serde_json::Value,
}

/// A TTL-bounded exclusive claim on a run by an owner id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub run_id: RunId,
    pub owner_id: String,
    pub acquired_at: DateTime<Utc>,
    pub renewed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Lease {
    pub fn is_held(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// A versioned, named configuration blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigVersion {
    pub id: i64,
    pub kind: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub is_active: bool,
    pub blob: serde_json::Value,
}

/// Outcome recorded for an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    Idle,
    Denied,
    Error,
}

/// A row in the append-only audit log. `payload`/`error` must be filtered of
/// secret-shaped keys before being persisted — see `av_storage::audit_log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRow {
    pub id: i64,
    pub ts: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_role: Option<String>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub result: AuditResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

/// Per-invocation tick caps for the scheduler/worker. `max_ticks_per_run_per_invocation`
/// and `daily_tick_cap` are accepted and round-tripped but never enforced —
/// see `av_engine::scheduler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerCaps {
    pub max_total_ticks_per_invocation: u32,
    #[serde(default)]
    pub max_ticks_per_run_per_invocation: u32,
    #[serde(default)]
    pub daily_tick_cap: u32,
}

impl SchedulerCaps {
    pub fn new(max_total_ticks_per_invocation: u32) -> Self {
        Self {
            max_total_ticks_per_invocation,
            max_ticks_per_run_per_invocation: 0,
            daily_tick_cap: 0,
        }
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;

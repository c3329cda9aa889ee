// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic single-step graph advancement. Grounded in the original
//! `graph_tick_v2.py`'s `tick_run`/`_select_next_step_id`.

use crate::artifact_writer::ArtifactWriter;
use crate::error::EngineError;
use crate::policy::{DispatchDecision, PolicyGate};
use av_core::{
    Clock, EventType, RunError, RunId, RunState, RunStatus, StepState, StepStatus,
};
use av_storage::{EventBus, RunStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct GraphTicker<C: Clock> {
    run_store: RunStore<C>,
    event_bus: EventBus<C>,
    clock: C,
    policy: Option<Arc<dyn PolicyGate>>,
    #[allow(dead_code)] // kept as a seam for future step kinds; see artifact_writer.rs
    artifact_writer: Option<Arc<dyn ArtifactWriter>>,
}

impl<C: Clock> GraphTicker<C> {
    pub fn new(
        run_store: RunStore<C>,
        event_bus: EventBus<C>,
        clock: C,
        policy: Option<Arc<dyn PolicyGate>>,
        artifact_writer: Option<Arc<dyn ArtifactWriter>>,
    ) -> Self {
        Self {
            run_store,
            event_bus,
            clock,
            policy,
            artifact_writer,
        }
    }

    /// Advances `run_id` by at most one step. The caller must already hold
    /// the run's lease.
    pub async fn tick_run(&self, run_id: &RunId) -> Result<RunState, EngineError> {
        let mut state = self.run_store.get_run_state(run_id).await?;

        // 1. Terminality: terminal statuses are absorbing.
        if state.status.is_terminal() {
            return Ok(state);
        }

        // 2. Start transition.
        if state.started_at.is_none() {
            state.started_at = Some(self.clock.now());
            state.status = RunStatus::Running;
            self.event_bus
                .publish(run_id, EventType::RunStarted, serde_json::json!({"run_id": run_id.as_str()}))
                .await?;
        }

        // 3. Step selection.
        let Some(step) = state.next_runnable_step().cloned() else {
            return self.finish_if_running(state).await;
        };

        // 4. Policy gate.
        if let Some(policy) = &self.policy {
            let DispatchDecision { ok, reason } = policy.dispatch_allowed(&state, &step).await;
            if !ok {
                let reason = reason.unwrap_or_else(|| "blocked by policy".to_string());
                state.status = RunStatus::Blocked;
                state.last_error = Some(RunError {
                    stage: "dispatch".into(),
                    reason: reason.clone(),
                    step_id: Some(step.id.clone()),
                });
                self.event_bus
                    .publish(
                        run_id,
                        EventType::RunBlocked,
                        serde_json::json!({"run_id": run_id.as_str(), "reason": reason, "step_id": step.id.as_str()}),
                    )
                    .await?;
                self.run_store.put_run_state(&state).await?;
                return Ok(state);
            }
        }

        // 5. Step execution.
        self.event_bus
            .publish(
                run_id,
                EventType::StepStarted,
                serde_json::json!({"run_id": run_id.as_str(), "step_id": step.id.as_str()}),
            )
            .await?;

        if step.kind.eq_ignore_ascii_case("noop") {
            state.step_states.insert(
                step.id.clone(),
                StepState {
                    status: StepStatus::Succeeded,
                    updated_at: self.clock.now(),
                },
            );
            self.event_bus
                .publish(
                    run_id,
                    EventType::StepSucceeded,
                    serde_json::json!({"run_id": run_id.as_str(), "step_id": step.id.as_str()}),
                )
                .await?;
        } else {
            let reason = format!("unsupported_kind:{}", step.kind);
            state.step_states.insert(
                step.id.clone(),
                StepState {
                    status: StepStatus::Failed,
                    updated_at: self.clock.now(),
                },
            );
            state.status = RunStatus::Failed;
            state.finished_at = Some(self.clock.now());
            state.last_error = Some(RunError {
                stage: "step".into(),
                reason: reason.clone(),
                step_id: Some(step.id.clone()),
            });
            self.event_bus
                .publish(
                    run_id,
                    EventType::StepFailed,
                    serde_json::json!({"run_id": run_id.as_str(), "step_id": step.id.as_str(), "reason": reason}),
                )
                .await?;
            self.run_store.put_run_state(&state).await?;
            return Ok(state);
        }

        // 6. Completion probe + 7. persist.
        self.finish_if_running(state).await
    }

    async fn finish_if_running(&self, mut state: RunState) -> Result<RunState, EngineError> {
        if state.status == RunStatus::Running && state.next_runnable_step().is_none() {
            state.status = RunStatus::Succeeded;
            state.finished_at = Some(self.clock.now());
            self.event_bus
                .publish(
                    &state.run_id,
                    EventType::RunSucceeded,
                    serde_json::json!({"run_id": state.run_id.as_str()}),
                )
                .await?;
        }
        self.run_store.put_run_state(&state).await?;
        Ok(state)
    }
}

#[cfg(test)]
#[path = "graph_ticker_tests.rs"]
mod tests;

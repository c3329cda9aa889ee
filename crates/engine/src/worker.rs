// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker tick loop: scheduler → lease → ticker → release, composed per
//! `worker_v2.py`'s `WorkerV2.tick_once`.

use crate::error::EngineError;
use crate::graph_ticker::GraphTicker;
use crate::scheduler::Scheduler;
use av_core::{Clock, EventType, SchedulerCaps};
use av_storage::{EventBus, KillSwitch, LeaseStore};
use chrono::Duration;
use serde::Serialize;

/// Summary of a single `tick_once` invocation.
#[derive(Debug, Clone, Serialize)]
pub struct TickSummary {
    pub owner_id: String,
    pub env: String,
    pub lane: String,
    pub ticks_used: u32,
    pub runs_ticked: u32,
}

#[derive(Clone)]
pub struct Worker<C: Clock> {
    scheduler: Scheduler<C>,
    lease_store: LeaseStore<C>,
    ticker: GraphTicker<C>,
    event_bus: EventBus<C>,
}

impl<C: Clock> Worker<C> {
    pub fn new(
        scheduler: Scheduler<C>,
        lease_store: LeaseStore<C>,
        ticker: GraphTicker<C>,
        event_bus: EventBus<C>,
    ) -> Self {
        Self {
            scheduler,
            lease_store,
            ticker,
            event_bus,
        }
    }

    /// Runs up to `caps.max_total_ticks_per_invocation` loop iterations
    /// against `(env, lane)`, releasing the lease on every exit path from an
    /// iteration regardless of whether the tick itself errored.
    ///
    /// The iteration count itself is bounded by the cap, not just
    /// `ticks_used`: `next_run_id` is not lease-aware, so a run whose lease
    /// is held by another owner is returned again on every pass, and an
    /// unbounded `continue` on lease-acquire failure would spin forever.
    pub async fn tick_once(
        &self,
        env: &str,
        lane: &str,
        owner_id: &str,
        caps: SchedulerCaps,
        lease_ttl: Duration,
        kill_switch: &KillSwitch<'_, C>,
    ) -> Result<TickSummary, EngineError> {
        let mut ticks_used = 0u32;
        let mut runs_ticked = 0u32;

        for _ in 0..caps.max_total_ticks_per_invocation {
            if Scheduler::<C>::enforce_caps(ticks_used, &caps).is_err() {
                break;
            }
            if !kill_switch.lane_enabled(env, lane).await? {
                break;
            }
            let Some(run_id) = self.scheduler.next_run_id(env, lane).await? else {
                break;
            };

            if !self.lease_store.acquire(&run_id, owner_id, lease_ttl).await? {
                // Someone else holds the lease; don't count a tick, but the
                // outer bound still advances so a contended run can't spin
                // the loop forever.
                continue;
            }

            self.event_bus
                .publish(
                    &run_id,
                    EventType::WorkerV2TickRequested,
                    serde_json::json!({"run_id": run_id.as_str(), "owner_id": owner_id, "env": env, "lane": lane}),
                )
                .await?;

            let tick_result = self.ticker.tick_run(&run_id).await;

            // Best-effort renew; a failure here is logged by the caller and
            // does not change the iteration's outcome.
            let _ = self.lease_store.renew(&run_id, owner_id, lease_ttl).await;

            // Guaranteed release on every exit path from this iteration,
            // regardless of whether tick_run returned an error.
            self.lease_store.release(&run_id, owner_id).await?;

            tick_result?;

            ticks_used += 1;
            runs_ticked += 1;
        }

        Ok(TickSummary {
            owner_id: owner_id.to_string(),
            env: env.to_string(),
            lane: lane.to_string(),
            ticks_used,
            runs_ticked,
        })
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;

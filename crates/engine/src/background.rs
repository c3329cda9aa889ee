// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic background ticker. Runs `Worker::tick_once` on a fixed cadence,
//! logging tick errors instead of propagating them.

use crate::worker::Worker;
use av_core::{Clock, SchedulerCaps};
use av_storage::KillSwitch;
use chrono::Duration as ChronoDuration;
use std::time::Duration;
use tracing::{info, warn};

/// Caps fixed for the background loop per run — never overridden by callers.
pub fn background_caps() -> SchedulerCaps {
    SchedulerCaps {
        max_total_ticks_per_invocation: 1,
        max_ticks_per_run_per_invocation: 1,
        daily_tick_cap: 10_000,
    }
}

pub const BACKGROUND_LEASE_TTL_SECONDS: i64 = 15;

pub fn background_owner_id(pid: u32) -> String {
    format!("bg:{pid}")
}

/// Runs `tick_once` against `(env, lane)` every `tick_interval_seconds` until
/// the process exits. Intended to be spawned as its own task; never returns.
pub async fn run_background_loop<C: Clock>(
    worker: Worker<C>,
    env: String,
    lane: String,
    owner_id: String,
    tick_interval_seconds: u64,
    kill_switch_registry: av_storage::ConfigRegistry<C>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(tick_interval_seconds.max(1)));
    info!(env = %env, lane = %lane, owner_id = %owner_id, "background ticker started");
    loop {
        ticker.tick().await;
        let kill_switch = KillSwitch::new(&kill_switch_registry);
        match worker
            .tick_once(
                &env,
                &lane,
                &owner_id,
                background_caps(),
                ChronoDuration::seconds(BACKGROUND_LEASE_TTL_SECONDS),
                &kill_switch,
            )
            .await
        {
            Ok(summary) if summary.runs_ticked > 0 => {
                info!(runs_ticked = summary.runs_ticked, "background tick completed")
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "background tick failed, continuing"),
        }
    }
}

#[cfg(test)]
#[path = "background_tests.rs"]
mod tests;

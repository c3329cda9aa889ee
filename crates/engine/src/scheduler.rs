// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FIFO run selection and per-invocation tick caps.
//!
//! `max_ticks_per_run_per_invocation` and `daily_tick_cap` are accepted on
//! [`SchedulerCaps`] and round-tripped through the API, but deliberately never
//! enforced here — see `SPEC_FULL.md` §9 and `DESIGN.md`.

use crate::error::EngineError;
use av_core::{Clock, RunId, SchedulerCaps};
use av_storage::RunStore;

#[derive(Clone)]
pub struct Scheduler<C: Clock> {
    run_store: RunStore<C>,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(run_store: RunStore<C>) -> Self {
        Self { run_store }
    }

    /// Oldest-first by `created_at` among runnable rows in `(env, lane)`.
    pub async fn next_run_id(&self, env: &str, lane: &str) -> Result<Option<RunId>, EngineError> {
        Ok(self.run_store.next_run_id(env, lane).await?)
    }

    /// Signals `CapReached` once `ticks_used` reaches the invocation's total
    /// cap. The per-run and daily caps are recognized fields only.
    pub fn enforce_caps(ticks_used: u32, caps: &SchedulerCaps) -> Result<(), EngineError> {
        if ticks_used >= caps.max_total_ticks_per_invocation {
            return Err(EngineError::CapReached);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-start gating for the background ticker, grounded in
//! `worker_guard_v2.py`'s `can_start_worker`/`mark_started_once`.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

static STARTED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerGuardStatus {
    pub enabled: bool,
    pub reason: String,
    pub pid: u32,
    pub configured_pid: u32,
}

/// Decides whether the current process may run the background ticker.
///
/// `pid` is the OS pid of this process; callers pass it explicitly rather
/// than reading `std::process::id()` here so the decision stays testable.
pub fn can_start_worker(enabled: bool, configured_pid: u32, pid: u32) -> WorkerGuardStatus {
    if !enabled {
        return WorkerGuardStatus {
            enabled: false,
            reason: "worker disabled by flag".to_string(),
            pid,
            configured_pid,
        };
    }
    if configured_pid != 0 && configured_pid != pid {
        return WorkerGuardStatus {
            enabled: false,
            reason: format!("pid mismatch (pid={pid} expected={configured_pid})"),
            pid,
            configured_pid,
        };
    }
    WorkerGuardStatus {
        enabled: true,
        reason: "ok".to_string(),
        pid,
        configured_pid,
    }
}

/// Returns `true` exactly once per process; every later call returns `false`.
/// Guards against double-starting the background loop under reloader quirks.
pub fn mark_started_once() -> bool {
    STARTED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
}

#[cfg(test)]
#[path = "worker_guard_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The policy gate seam consulted by the graph ticker before a step is
//! dispatched. Grounded in the original `policy_loader_v2.py`, which is
//! itself a pluggable, mostly-empty registry — this rewrite keeps the same
//! narrow shape rather than inventing policy logic the source never had.

use async_trait::async_trait;
use av_core::{RunState, StepDef};

/// Outcome of a dispatch check: `ok = true` allows the step to run;
/// `ok = false` blocks the run with `reason`.
pub struct DispatchDecision {
    pub ok: bool,
    pub reason: Option<String>,
}

impl DispatchDecision {
    pub fn allow() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

#[async_trait]
pub trait PolicyGate: Send + Sync {
    async fn dispatch_allowed(&self, state: &RunState, step: &StepDef) -> DispatchDecision;
}

/// The default policy: allows every dispatch. Mirrors the original
/// `AutonomyPolicyLoaderV2`'s behavior when no policy has been registered for
/// a job type.
#[derive(Default)]
pub struct AllowAllPolicy;

#[async_trait]
impl PolicyGate for AllowAllPolicy {
    async fn dispatch_allowed(&self, _state: &RunState, _step: &StepDef) -> DispatchDecision {
        DispatchDecision::allow()
    }
}

/// A named-policy registry, mirroring `AutonomyPolicyLoaderV2.register_policy`
/// / `get_all_policies`: callers can register a policy per job type and the
/// registry dispatches to it, falling back to allow-all for unregistered
/// types.
#[derive(Default)]
pub struct PolicyRegistry {
    policies: std::collections::HashMap<String, Box<dyn PolicyGate>>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_policy(&mut self, job_type: impl Into<String>, policy: Box<dyn PolicyGate>) {
        self.policies.insert(job_type.into(), policy);
    }

    pub fn get_all_policies(&self) -> Vec<&str> {
        self.policies.keys().map(String::as_str).collect()
    }
}

#[async_trait]
impl PolicyGate for PolicyRegistry {
    async fn dispatch_allowed(&self, state: &RunState, step: &StepDef) -> DispatchDecision {
        match self.policies.get(&state.job_type) {
            Some(policy) => policy.dispatch_allowed(state, step).await,
            None => DispatchDecision::allow(),
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lane-level enable/disable. The flat overlay key
//! `kill_switch.<env>.<lane>.lane_enabled` takes precedence over the
//! versioned `kill_switch_v2` blob when both are present — the original
//! system left this ambiguous; this rewrite fixes flat-key-wins (see
//! DESIGN.md).

use crate::config_registry::ConfigRegistry;
use crate::error::StorageResult;
use av_core::Clock;

pub const KILL_SWITCH_KIND: &str = "kill_switch_v2";

fn flat_key(env: &str, lane: &str) -> String {
    format!("kill_switch.{env}.{lane}.lane_enabled")
}

pub struct KillSwitch<'a, C: Clock> {
    registry: &'a ConfigRegistry<C>,
}

impl<'a, C: Clock> KillSwitch<'a, C> {
    pub fn new(registry: &'a ConfigRegistry<C>) -> Self {
        Self { registry }
    }

    /// Ensures the versioned blob exists with default-allow semantics
    /// (`{"lanes": {}}`), matching the registry's ensure-default shim.
    pub async fn ensure_default(&self) -> StorageResult<()> {
        self.registry
            .ensure_default(KILL_SWITCH_KIND, serde_json::json!({"lanes": {}}), "system")
            .await
    }

    /// Resolves whether `(env, lane)` is enabled. Precedence: flat overlay
    /// key, then the versioned blob's `lanes."<env>:<lane>"` entry, defaulting
    /// to `true` when neither is present.
    pub async fn lane_enabled(&self, env: &str, lane: &str) -> StorageResult<bool> {
        if let Some(flat) = self.registry.get(&flat_key(env, lane)).await? {
            if let Some(b) = flat.as_bool() {
                return Ok(b);
            }
        }

        if let Some(active) = self.registry.get_active(KILL_SWITCH_KIND).await? {
            let key = format!("{env}:{lane}");
            if let Some(b) = active.blob.get("lanes").and_then(|lanes| lanes.get(&key)).and_then(|v| v.as_bool()) {
                return Ok(b);
            }
        }

        Ok(true)
    }

    /// Sets the flat overlay key directly — the admin `set_lane_enabled`
    /// operation always writes here, never to the versioned blob.
    pub async fn set_lane_enabled(&self, env: &str, lane: &str, enabled: bool) -> StorageResult<()> {
        self.registry
            .set(&flat_key(env, lane), serde_json::json!(enabled))
            .await
    }
}

#[cfg(test)]
#[path = "kill_switch_tests.rs"]
mod tests;

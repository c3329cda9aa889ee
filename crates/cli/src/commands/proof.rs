// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `av proof` - the noop one-shot end-to-end scenario: create a single-step
//! `noop` run, tick it once, and assert it reaches `succeeded` with the
//! expected event sequence. Exits non-zero with a one-line diagnostic on
//! any deviation.

use anyhow::{bail, Result};
use av_core::{RunGraph, RunMode, RunStatus, StepDef, StepId};
use av_storage::KillSwitch;
use clap::Args;
use std::collections::BTreeMap;

use crate::app::App;
use crate::color;

#[derive(Args)]
pub struct ProofArgs {
    #[arg(long, default_value = "local")]
    pub env: String,
    #[arg(long, default_value = "default")]
    pub lane: String,
    #[arg(long = "owner-id", default_value = "proof")]
    pub owner_id: String,
}

pub async fn run(args: ProofArgs, app: &App) -> Result<()> {
    let step_id = StepId::new("noop");
    let mut steps = BTreeMap::new();
    steps.insert(
        step_id.clone(),
        StepDef {
            id: step_id.clone(),
            deps: Vec::new(),
            kind: "noop".to_string(),
        },
    );
    let run_graph = RunGraph { entry_step: step_id, steps };

    let run_id = app
        .run_store
        .create_run(
            &args.env,
            &args.lane,
            RunMode::DryRun,
            "proof",
            &args.owner_id,
            run_graph,
            serde_json::Value::Null,
            None,
        )
        .await?;

    let kill_switch = KillSwitch::new(&app.config_registry);
    kill_switch.ensure_default().await?;
    kill_switch.set_lane_enabled(&args.env, &args.lane, true).await?;

    let summary = app
        .worker
        .tick_once(
            &args.env,
            &args.lane,
            &args.owner_id,
            av_core::SchedulerCaps::new(1),
            chrono::Duration::seconds(15),
            &kill_switch,
        )
        .await?;

    if summary.runs_ticked != 1 {
        bail!("expected exactly one run ticked, got {}", summary.runs_ticked);
    }

    let state = app.run_store.get_run_state(&run_id).await?;
    if state.status != RunStatus::Succeeded {
        bail!("expected run to reach succeeded, got {:?}", state.status);
    }

    let events = app.event_bus.replay(&run_id, 100).await?;
    if events.len() < 4 {
        bail!("expected at least 4 events, got {}", events.len());
    }

    println!(
        "{} run {} succeeded after {} event(s)",
        color::green("PROOF OK"),
        run_id.as_str(),
        events.len()
    );
    Ok(())
}

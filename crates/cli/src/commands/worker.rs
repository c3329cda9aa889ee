// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `av worker tick-once` - run one scheduler/lease/ticker iteration directly.

use anyhow::Result;
use av_core::SchedulerCaps;
use av_storage::KillSwitch;
use clap::{Args, Subcommand};

use crate::app::App;
use crate::color;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct WorkerArgs {
    #[command(subcommand)]
    pub command: WorkerCommand,
}

#[derive(Subcommand)]
pub enum WorkerCommand {
    /// Run a single `tick_once` pass against an env/lane.
    TickOnce(TickOnceArgs),
}

#[derive(Args)]
pub struct TickOnceArgs {
    #[arg(long)]
    pub env: String,
    #[arg(long)]
    pub lane: String,
    #[arg(long = "owner-id", default_value = "cli")]
    pub owner_id: String,
    #[arg(long = "max-total-ticks", default_value_t = 1)]
    pub max_total_ticks: u32,
    #[arg(long = "lease-ttl-seconds", default_value_t = 15)]
    pub lease_ttl_seconds: i64,
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    pub output: OutputFormat,
}

pub async fn run(args: WorkerArgs, app: &App) -> Result<()> {
    match args.command {
        WorkerCommand::TickOnce(a) => tick_once(a, app).await,
    }
}

async fn tick_once(args: TickOnceArgs, app: &App) -> Result<()> {
    let kill_switch = KillSwitch::new(&app.config_registry);
    let caps = SchedulerCaps::new(args.max_total_ticks);

    let summary = app
        .worker
        .tick_once(
            &args.env,
            &args.lane,
            &args.owner_id,
            caps,
            chrono::Duration::seconds(args.lease_ttl_seconds),
            &kill_switch,
        )
        .await?;

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            let status = if summary.runs_ticked > 0 { "success" } else { "idle" };
            println!(
                "{} {} ({} run(s) ticked)",
                color::header("tick_once:"),
                color::status(status),
                summary.runs_ticked
            );
        }
    }
    Ok(())
}

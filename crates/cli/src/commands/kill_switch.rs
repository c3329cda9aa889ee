// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `av kill-switch set` - flip a lane's `kill_switch.<env>.<lane>.lane_enabled` flag.

use anyhow::Result;
use av_storage::KillSwitch;
use clap::{Args, Subcommand};

use crate::app::App;
use crate::color;

#[derive(Args)]
pub struct KillSwitchArgs {
    #[command(subcommand)]
    pub command: KillSwitchCommand,
}

#[derive(Subcommand)]
pub enum KillSwitchCommand {
    /// Enable or disable a lane.
    Set(SetArgs),
    /// Show whether a lane is currently enabled.
    Get(GetArgs),
}

#[derive(Args)]
pub struct SetArgs {
    #[arg(long)]
    pub env: String,
    #[arg(long)]
    pub lane: String,
    #[arg(long)]
    pub enabled: bool,
}

#[derive(Args)]
pub struct GetArgs {
    #[arg(long)]
    pub env: String,
    #[arg(long)]
    pub lane: String,
}

pub async fn run(args: KillSwitchArgs, app: &App) -> Result<()> {
    match args.command {
        KillSwitchCommand::Set(a) => set(a, app).await,
        KillSwitchCommand::Get(a) => get(a, app).await,
    }
}

async fn set(args: SetArgs, app: &App) -> Result<()> {
    let kill_switch = KillSwitch::new(&app.config_registry);
    kill_switch.ensure_default().await?;
    kill_switch.set_lane_enabled(&args.env, &args.lane, args.enabled).await?;
    println!(
        "{} {}/{} -> {}",
        color::header("kill-switch"),
        args.env,
        args.lane,
        if args.enabled { color::green("enabled") } else { color::yellow("disabled") }
    );
    Ok(())
}

async fn get(args: GetArgs, app: &App) -> Result<()> {
    let kill_switch = KillSwitch::new(&app.config_registry);
    kill_switch.ensure_default().await?;
    let enabled = kill_switch.lane_enabled(&args.env, &args.lane).await?;
    println!(
        "{}/{}: {}",
        args.env,
        args.lane,
        if enabled { color::green("enabled") } else { color::yellow("disabled") }
    );
    Ok(())
}

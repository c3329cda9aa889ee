// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `av run <command>` - create, list, and inspect runs directly against storage.

use anyhow::{bail, Result};
use av_core::{RunGraph, RunId, RunMode, RunStatus, StepDef, StepId};
use av_storage::cursor::{EventCursor, RunCursor};
use av_storage::RunFilter;
use clap::{Args, Subcommand};
use std::collections::BTreeMap;

use crate::app::App;
use crate::color;
use crate::output::{format_time_ago, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct RunArgs {
    #[command(subcommand)]
    pub command: RunCommand,
}

#[derive(Subcommand)]
pub enum RunCommand {
    /// Create a run with the given graph, env, and lane.
    Create(CreateArgs),
    /// List runs, newest first.
    List(ListArgs),
    /// Show a single run's detail.
    Show(ShowArgs),
    /// Show a run's event log.
    Events(EventsArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub env: String,
    #[arg(long)]
    pub lane: String,
    #[arg(long, value_enum, default_value = "dry-run")]
    pub mode: ModeArg,
    #[arg(long = "job-type")]
    pub job_type: String,
    #[arg(long = "requested-by")]
    pub requested_by: String,
    /// Build a single-step `noop` run graph with the given step id as entry.
    #[arg(long = "noop-step", default_value = "noop")]
    pub noop_step: String,
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ModeArg {
    DryRun,
    RealRun,
}

impl From<ModeArg> for RunMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::DryRun => RunMode::DryRun,
            ModeArg::RealRun => RunMode::RealRun,
        }
    }
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long)]
    pub env: Option<String>,
    #[arg(long)]
    pub lane: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long = "requested-by")]
    pub requested_by: Option<String>,
    #[arg(long, default_value_t = 50)]
    pub limit: u32,
    #[arg(long)]
    pub cursor: Option<String>,
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Args)]
pub struct ShowArgs {
    pub run_id: String,
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Args)]
pub struct EventsArgs {
    pub run_id: String,
    #[arg(long, default_value_t = 200)]
    pub limit: u32,
    #[arg(long)]
    pub cursor: Option<String>,
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    pub output: OutputFormat,
}

pub async fn run(args: RunArgs, app: &App) -> Result<()> {
    match args.command {
        RunCommand::Create(a) => create(a, app).await,
        RunCommand::List(a) => list(a, app).await,
        RunCommand::Show(a) => show(a, app).await,
        RunCommand::Events(a) => events(a, app).await,
    }
}

async fn create(args: CreateArgs, app: &App) -> Result<()> {
    let step_id = StepId::new(args.noop_step.clone());
    let mut steps = BTreeMap::new();
    steps.insert(
        step_id.clone(),
        StepDef {
            id: step_id.clone(),
            deps: Vec::new(),
            kind: "noop".to_string(),
        },
    );
    let run_graph = RunGraph {
        entry_step: step_id,
        steps,
    };

    let run_id = app
        .run_store
        .create_run(
            &args.env,
            &args.lane,
            args.mode.into(),
            &args.job_type,
            &args.requested_by,
            run_graph,
            serde_json::Value::Null,
            None,
        )
        .await?;

    match args.output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "run_id": run_id.as_str(),
                    "status": "created",
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{} {}", color::header("created run"), run_id.as_str());
        }
    }
    Ok(())
}

async fn list(args: ListArgs, app: &App) -> Result<()> {
    if args.limit == 0 || args.limit > 200 {
        bail!("--limit must be between 1 and 200");
    }
    let status = args.status.as_deref().map(parse_status).transpose()?;
    let cursor = args.cursor.as_deref().map(RunCursor::decode).transpose()?;

    let filter = RunFilter {
        env: args.env,
        lane: args.lane,
        status,
        requested_by: args.requested_by,
    };
    let (items, next_cursor) = app.run_store.list_runs(&filter, args.limit, cursor.as_ref()).await?;

    match args.output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "items": items,
                    "next_cursor": next_cursor.as_ref().map(RunCursor::encode),
                }))?
            );
        }
        OutputFormat::Text => {
            let mut table = Table::new(vec![
                Column::left("RUN_ID"),
                Column::left("ENV"),
                Column::left("LANE"),
                Column::status("STATUS"),
                Column::muted("CREATED"),
            ]);
            for item in &items {
                table.row(vec![
                    item.run_id.short(12).to_string(),
                    item.env.clone(),
                    item.lane.clone(),
                    status_str(item.status).to_string(),
                    format_time_ago(item.created_at.timestamp_millis() as u64),
                ]);
            }
            table.render(&mut std::io::stdout());
            if let Some(next) = next_cursor {
                println!("{} {}", color::muted("next cursor:"), next.encode());
            }
        }
    }
    Ok(())
}

async fn show(args: ShowArgs, app: &App) -> Result<()> {
    let run_id = RunId::new(args.run_id);
    let state = app.run_store.get_run_state(&run_id).await?;

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        OutputFormat::Text => {
            println!("{} {}", color::header("run"), state.run_id.as_str());
            println!("  env:    {}", state.env);
            println!("  lane:   {}", state.lane);
            println!("  status: {}", color::status(status_str(state.status)));
            println!("  job:    {}", state.job_type);
            if let Some(err) = &state.last_error {
                println!("  error:  {} ({})", err.reason, err.stage);
            }
        }
    }
    Ok(())
}

async fn events(args: EventsArgs, app: &App) -> Result<()> {
    if args.limit == 0 || args.limit > 500 {
        bail!("--limit must be between 1 and 500");
    }
    let run_id = RunId::new(args.run_id);
    // Confirms the run exists, matching the HTTP endpoint's 404 behavior.
    app.run_store.get_run_summary(&run_id).await?;

    let cursor = args.cursor.as_deref().map(EventCursor::decode).transpose()?;
    let (events, next_cursor) = app.event_bus.replay_page(&run_id, args.limit, cursor.as_ref()).await?;

    match args.output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "items": events,
                    "next_cursor": next_cursor.as_ref().map(EventCursor::encode),
                }))?
            );
        }
        OutputFormat::Text => {
            for event in &events {
                println!(
                    "{}  {:?}  {}",
                    event.ts.to_rfc3339(),
                    event.event_type,
                    event.payload
                );
            }
            if let Some(next) = next_cursor {
                println!("{} {}", color::muted("next cursor:"), next.encode());
            }
        }
    }
    Ok(())
}

fn status_str(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Queued => "queued",
        RunStatus::Running => "running",
        RunStatus::Succeeded => "succeeded",
        RunStatus::Failed => "failed",
        RunStatus::Blocked => "blocked",
        RunStatus::Canceled => "canceled",
    }
}

fn parse_status(raw: &str) -> Result<RunStatus> {
    Ok(match raw {
        "queued" => RunStatus::Queued,
        "running" => RunStatus::Running,
        "succeeded" => RunStatus::Succeeded,
        "failed" => RunStatus::Failed,
        "blocked" => RunStatus::Blocked,
        "canceled" => RunStatus::Canceled,
        other => bail!("unknown status {other:?}"),
    })
}

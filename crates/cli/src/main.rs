// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! av - Autonomy V2 operator CLI

mod app;
mod color;
mod commands;
mod output;
mod table;

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

use app::App;
use commands::{kill_switch, proof, run, worker};

#[derive(Parser)]
#[command(
    name = "av",
    version,
    disable_version_flag = true,
    about = "Autonomy V2 - run orchestration control plane"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, list, and inspect runs.
    Run(run::RunArgs),
    /// Drive the worker tick loop directly.
    Worker(worker::WorkerArgs),
    /// Flip or inspect a lane's kill switch.
    KillSwitch(kill_switch::KillSwitchArgs),
    /// Run the noop one-shot end-to-end proof scenario.
    Proof(proof::ProofArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        eprintln!("Error: {}", format_error(&e));
        std::process::exit(1);
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains the source error text, skip the
/// "Caused by" chain to avoid noisy duplicate output (common with thiserror
/// variants using `#[error("... {0}")]` with `#[from]`).
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();
    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

fn cli_command() -> clap::Command {
    Cli::command()
        .styles(color::styles())
        .arg(
            clap::Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .action(clap::ArgAction::Version)
                .help("Print version"),
        )
}

async fn run_cli() -> Result<()> {
    let matches = cli_command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    let app = App::connect().await?;

    match cli.command {
        Commands::Run(args) => run::run(args, &app).await,
        Commands::Worker(args) => worker::run(args, &app).await,
        Commands::KillSwitch(args) => kill_switch::run(args, &app).await,
        Commands::Proof(args) => proof::run(args, &app).await,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

//! Usage errors: missing subcommands, unknown flags, missing database config.

use crate::prelude::*;

#[test]
fn no_args_shows_usage_error() {
    cli().fails().stderr_has("Usage");
}

#[test]
fn unknown_subcommand_fails() {
    cli().args(&["frobnicate"]).fails();
}

#[test]
fn run_requires_a_further_subcommand() {
    cli().args(&["run"]).fails().stderr_has("Usage");
}

#[test]
fn missing_forge_db_path_fails_with_context() {
    // `av proof` hits `App::connect()` before any subcommand logic, so a
    // missing FORGE_DB_PATH surfaces as a configuration error, not a panic.
    cli().args(&["proof"]).fails().stderr_has("FORGE_DB_PATH");
}

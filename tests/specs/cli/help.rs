//! `--help` and `--version` never touch the database.

use crate::prelude::*;

#[test]
fn top_level_help_lists_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("worker")
        .stdout_has("kill-switch")
        .stdout_has("proof");
}

#[test]
fn version_short_lowercase_v() {
    cli().args(&["-v"]).passes();
}

#[test]
fn run_help_lists_subcommands() {
    cli()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("create")
        .stdout_has("list")
        .stdout_has("show")
        .stdout_has("events");
}

#[test]
fn worker_help_lists_tick_once() {
    cli().args(&["worker", "--help"]).passes().stdout_has("tick-once");
}

#[test]
fn kill_switch_help_lists_set_and_get() {
    cli()
        .args(&["kill-switch", "--help"])
        .passes()
        .stdout_has("set")
        .stdout_has("get");
}

//! `av worker tick-once`

use crate::prelude::*;

#[test]
fn tick_once_on_an_empty_lane_is_idle() {
    let db = Db::fresh();
    db.av()
        .args(&["kill-switch", "set", "--env", "local", "--lane", "default", "--enabled"])
        .passes();

    db.av()
        .args(&["worker", "tick-once", "--env", "local", "--lane", "default"])
        .passes()
        .stdout_has("idle");
}

#[test]
fn tick_once_skips_runs_on_a_disabled_lane() {
    let db = Db::fresh();
    db.av()
        .args([
            "run",
            "create",
            "--env",
            "local",
            "--lane",
            "default",
            "--job-type",
            "smoke-test",
            "--requested-by",
            "spec",
        ]
        .as_slice())
        .passes();
    db.av()
        .args(&["kill-switch", "set", "--env", "local", "--lane", "default"])
        .passes();

    let out = db
        .av()
        .args(&["worker", "tick-once", "--env", "local", "--lane", "default", "-o", "json"])
        .passes()
        .stdout();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["runs_ticked"], 0);
}

#[test]
fn tick_once_ticks_a_queued_run_on_an_enabled_lane() {
    let db = Db::fresh();
    let out = db
        .av()
        .args(&[
            "run",
            "create",
            "--env",
            "local",
            "--lane",
            "default",
            "--job-type",
            "smoke-test",
            "--requested-by",
            "spec",
            "-o",
            "json",
        ])
        .passes()
        .stdout();
    let created: serde_json::Value = serde_json::from_str(&out).unwrap();
    let run_id = created["run_id"].as_str().unwrap();

    db.av()
        .args(&["kill-switch", "set", "--env", "local", "--lane", "default", "--enabled"])
        .passes();

    let tick_out = db
        .av()
        .args(&["worker", "tick-once", "--env", "local", "--lane", "default", "-o", "json"])
        .passes()
        .stdout();
    let value: serde_json::Value = serde_json::from_str(&tick_out).unwrap();
    assert_eq!(value["runs_ticked"], 1);

    db.av()
        .args(&["run", "show", run_id])
        .passes()
        .stdout_has("succeeded");
}

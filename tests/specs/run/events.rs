//! `av run events`

use crate::prelude::*;

#[test]
fn events_of_an_unknown_run_fails() {
    let db = Db::fresh();
    db.av().args(&["run", "events", "does-not-exist"]).fails();
}

#[test]
fn events_rejects_limit_over_500() {
    let db = Db::fresh();
    db.av()
        .args(&["run", "events", "whatever", "--limit", "9000"])
        .fails()
        .stderr_has("--limit");
}

#[test]
fn a_freshly_created_run_has_no_events_until_ticked() {
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

    let events_out = db
        .av()
        .args(&["run", "events", run_id, "-o", "json"])
        .passes()
        .stdout();
    let value: serde_json::Value = serde_json::from_str(&events_out).unwrap();
    assert!(value["items"].as_array().unwrap().is_empty());
}

#[test]
fn ticking_a_run_produces_its_event_log() {
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
    db.av()
        .args(&["worker", "tick-once", "--env", "local", "--lane", "default"])
        .passes();

    let events_out = db
        .av()
        .args(&["run", "events", run_id, "-o", "json"])
        .passes()
        .stdout();
    let value: serde_json::Value = serde_json::from_str(&events_out).unwrap();
    let items = value["items"].as_array().unwrap();
    assert!(items.len() >= 4);
}

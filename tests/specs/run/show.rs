//! `av run show`

use crate::prelude::*;

#[test]
fn show_an_unknown_run_fails() {
    let db = Db::fresh();
    db.av().args(&["run", "show", "does-not-exist"]).fails();
}

#[test]
fn show_a_created_run_reports_queued_status() {
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
        .args(&["run", "show", run_id])
        .passes()
        .stdout_has("queued");

    let json_out = db
        .av()
        .args(&["run", "show", run_id, "-o", "json"])
        .passes()
        .stdout();
    let state: serde_json::Value = serde_json::from_str(&json_out).unwrap();
    assert_eq!(state["run_id"], run_id);
    assert_eq!(state["status"], "queued");
    assert_eq!(state["env"], "local");
    assert_eq!(state["lane"], "default");
}

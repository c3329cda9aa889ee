//! `av run create`

use crate::prelude::*;

#[test]
fn create_prints_the_new_run_id() {
    let db = Db::fresh();
    db.av()
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
        ])
        .passes()
        .stdout_has("created run");
}

#[test]
fn create_json_output_has_run_id_and_status() {
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

    let value: serde_json::Value = serde_json::from_str(&out).expect("valid json");
    assert_eq!(value["status"], "created");
    assert!(!value["run_id"].as_str().unwrap().is_empty());
}

#[test]
fn create_defaults_to_dry_run_mode() {
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
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    let run_id = value["run_id"].as_str().unwrap();

    db.av()
        .args(&["run", "show", run_id, "-o", "json"])
        .passes()
        .stdout_has("\"status\"");
}

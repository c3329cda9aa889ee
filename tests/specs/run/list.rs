//! `av run list`

use crate::prelude::*;

fn create_run(db: &Db, env: &str, lane: &str) -> String {
    let out = db
        .av()
        .args(&[
            "run",
            "create",
            "--env",
            env,
            "--lane",
            lane,
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
    value["run_id"].as_str().unwrap().to_string()
}

#[test]
fn list_is_empty_before_any_run_is_created() {
    let db = Db::fresh();
    let out = db.av().args(&["run", "list", "-o", "json"]).passes().stdout();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["items"].as_array().unwrap().len(), 0);
}

#[test]
fn list_returns_created_runs() {
    let db = Db::fresh();
    let run_id = create_run(&db, "local", "default");

    let out = db.av().args(&["run", "list", "-o", "json"]).passes().stdout();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    let items = value["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["run_id"], run_id);
}

#[test]
fn list_filters_by_lane() {
    let db = Db::fresh();
    create_run(&db, "local", "alpha");
    create_run(&db, "local", "beta");

    let out = db
        .av()
        .args(&["run", "list", "--lane", "alpha", "-o", "json"])
        .passes()
        .stdout();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    let items = value["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["lane"], "alpha");
}

#[test]
fn list_rejects_limit_over_200() {
    let db = Db::fresh();
    db.av()
        .args(&["run", "list", "--limit", "500"])
        .fails()
        .stderr_has("--limit");
}

#[test]
fn list_text_output_renders_a_table() {
    let db = Db::fresh();
    create_run(&db, "local", "default");

    db.av()
        .args(&["run", "list"])
        .passes()
        .stdout_has("RUN_ID")
        .stdout_has("STATUS");
}

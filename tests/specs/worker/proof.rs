//! `av proof` — the noop one-shot end-to-end scenario.

use crate::prelude::*;

#[test]
fn proof_succeeds_against_a_fresh_database() {
    let db = Db::fresh();
    db.av()
        .args(&["proof"])
        .passes()
        .stdout_has("PROOF OK");
}

#[test]
fn proof_enables_the_lane_it_runs_against_as_a_side_effect() {
    let db = Db::fresh();
    db.av().args(&["proof"]).passes();

    db.av()
        .args(&["kill-switch", "get", "--env", "local", "--lane", "default"])
        .passes()
        .stdout_has("enabled");
}

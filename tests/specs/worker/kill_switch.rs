//! `av kill-switch set` / `av kill-switch get`

use crate::prelude::*;

#[test]
fn a_lane_defaults_to_enabled() {
    let db = Db::fresh();
    db.av()
        .args(&["kill-switch", "get", "--env", "local", "--lane", "default"])
        .passes()
        .stdout_has("enabled");
}

#[test]
fn set_without_enabled_flag_disables_the_lane() {
    let db = Db::fresh();
    db.av()
        .args(&["kill-switch", "set", "--env", "local", "--lane", "default"])
        .passes()
        .stdout_has("disabled");

    db.av()
        .args(&["kill-switch", "get", "--env", "local", "--lane", "default"])
        .passes()
        .stdout_has("disabled");
}

#[test]
fn set_enabled_flips_a_disabled_lane_back_on() {
    let db = Db::fresh();
    db.av()
        .args(&["kill-switch", "set", "--env", "local", "--lane", "default"])
        .passes();
    db.av()
        .args(&["kill-switch", "set", "--env", "local", "--lane", "default", "--enabled"])
        .passes()
        .stdout_has("enabled");

    db.av()
        .args(&["kill-switch", "get", "--env", "local", "--lane", "default"])
        .passes()
        .stdout_has("enabled");
}

#[test]
fn lanes_are_independent() {
    let db = Db::fresh();
    db.av()
        .args(&["kill-switch", "set", "--env", "local", "--lane", "alpha"])
        .passes();

    // `beta` was never touched and keeps the default-allow value.
    db.av()
        .args(&["kill-switch", "get", "--env", "local", "--lane", "beta"])
        .passes()
        .stdout_has("enabled");

    db.av()
        .args(&["kill-switch", "get", "--env", "local", "--lane", "alpha"])
        .passes()
        .stdout_has("disabled");
}

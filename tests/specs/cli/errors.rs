//! Argument and configuration error specs

use crate::prelude::*;

#[test]
fn run_without_command_is_a_usage_error() {
    let temp = Workspace::empty();

    temp.dbsem().args(&["run", "jobs"]).exits_with(2);
}

#[test]
fn unparseable_timeout_is_a_usage_error() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["run", "jobs", "--timeout", "soon", "--", "true"])
        .exits_with(2)
        .stderr_has("--timeout");
}

#[test]
fn zero_timeout_is_rejected_before_running() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["run", "jobs", "--timeout", "0s", "--", "echo", "ran"])
        .exits_with(1)
        .stderr_has("lease timeout must be greater than zero")
        .stdout_lacks("ran");
}

#[test]
fn zero_slots_are_rejected_before_running() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["run", "jobs", "--max", "0", "--", "echo", "ran"])
        .exits_with(1)
        .stderr_has("max lock count for 'jobs' must be at least 1")
        .stdout_lacks("ran");
}

#[test]
fn blank_holder_is_rejected() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["exclusive", "jobs", "--holder", " ", "--", "true"])
        .exits_with(1)
        .stderr_has("context cannot be blank");
}

#[test]
fn malformed_config_is_reported() {
    let temp = Workspace::empty();
    let config = temp.file("dbsem.toml", "[runner\n");

    temp.dbsem()
        .args(&["--config", config.to_str().unwrap(), "gc"])
        .exits_with(1)
        .stderr_has("TOML parse error");
}

#[test]
fn invalid_config_values_are_reported() {
    let temp = Workspace::empty();
    let config = temp.file("dbsem.toml", "[runner]\nkeepalive_fraction = 1\n");

    temp.dbsem()
        .args(&["--config", config.to_str().unwrap(), "gc"])
        .exits_with(1)
        .stderr_has("invalid configuration");
}

#[test]
fn missing_config_file_is_reported() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["--config", "/nonexistent/dbsem.toml", "gc"])
        .exits_with(1)
        .stderr_has("/nonexistent/dbsem.toml");
}

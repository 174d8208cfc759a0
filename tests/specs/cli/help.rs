//! Help output specs

use crate::prelude::*;

#[test]
fn help_lists_every_command() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["--help"])
        .passes()
        .stdout_has("status")
        .stdout_has("gc")
        .stdout_has("release-all")
        .stdout_has("run")
        .stdout_has("exclusive");
}

#[test]
fn run_help_shows_lease_flags() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--timeout")
        .stdout_has("--holder")
        .stdout_has("--max");
}

#[test]
fn exclusive_help_shows_wait_flag() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["exclusive", "--help"])
        .passes()
        .stdout_has("--wait");
}

//! `dbsem exclusive` specs: commands under the exclusive lock

use crate::prelude::*;

#[test]
fn runs_the_command() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["exclusive", "schema", "--", "echo", "migrating"])
        .passes()
        .stdout_eq("migrating\n");
}

#[test]
fn passes_the_exit_status_through() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["exclusive", "schema", "--", "sh", "-c", "exit 4"])
        .exits_with(4);
}

#[test]
fn second_writer_is_turned_away() {
    let temp = Workspace::empty();
    let bin = dbsem_bin();

    temp.dbsem()
        .args(&["exclusive", "schema", "--holder", "writer-1", "--", &bin, "exclusive", "schema", "--", "true"])
        .exits_with(EXIT_UNAVAILABLE)
        .stderr_has("write lock unavailable for 'schema' (held by writer-1)");
}

#[test]
fn status_shows_promoted_lease_without_intent() {
    let temp = Workspace::empty();
    let bin = dbsem_bin();

    temp.dbsem()
        .args(&["exclusive", "schema", "--holder", "writer-1", "--", &bin, "status", "schema"])
        .passes()
        .stdout_has("exclusive")
        .stdout_has("writer-1")
        .stdout_lacks("intent");
}

#[test]
fn lock_is_released_afterwards() {
    let temp = Workspace::empty();
    temp.dbsem()
        .args(&["exclusive", "schema", "--", "true"])
        .passes();

    temp.dbsem()
        .args(&["status", "schema"])
        .passes()
        .stdout_eq("schema: free\n");
}

//! `dbsem gc` and `dbsem release-all` specs

use crate::prelude::*;

#[test]
fn gc_on_empty_store() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["gc"])
        .passes()
        .stdout_eq("Removed 0 expired rows (0 remaining)\n");
}

#[test]
fn released_leases_leave_rows_for_gc() {
    let temp = Workspace::empty();
    temp.dbsem().args(&["run", "jobs", "--", "true"]).passes();

    temp.dbsem()
        .args(&["gc"])
        .passes()
        .stdout_has("(0 remaining)");
}

#[test]
fn release_all_reports_success() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["release-all"])
        .passes()
        .stdout_eq("Released every lease\n");
}

#[test]
fn release_all_frees_a_held_key() {
    let temp = Workspace::empty();
    let bin = dbsem_bin();
    let script = format!("{bin} release-all && {bin} run jobs -- true");

    // The counting release of the outer run is then stale, which is not an error
    temp.dbsem()
        .args(&["run", "jobs", "--", "sh", "-c", &script])
        .passes();
}

#[test]
fn exclusive_release_after_release_all_fails() {
    let temp = Workspace::empty();
    let bin = dbsem_bin();

    temp.dbsem()
        .args(&["exclusive", "jobs", "--", &bin, "release-all"])
        .exits_with(1)
        .stderr_has("write lock release failed for 'jobs'");
}

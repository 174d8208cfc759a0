//! `dbsem status` specs

use crate::prelude::*;

#[test]
fn unknown_key_is_free() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["status", "jobs"])
        .passes()
        .stdout_eq("jobs: free\n");
}

#[test]
fn json_status_of_free_key() {
    let temp = Workspace::empty();

    let out = temp
        .dbsem()
        .args(&["status", "jobs", "--format", "json"])
        .passes();
    let status: serde_json::Value = serde_json::from_str(&out.stdout()).unwrap();

    assert_eq!(status["key"], "jobs");
    assert_eq!(status["leases"].as_array().map(Vec::len), Some(0));
    assert!(status["write_intent"].is_null());
}

#[test]
fn status_inside_a_run_shows_the_holder() {
    let temp = Workspace::empty();
    let bin = dbsem_bin();

    temp.dbsem()
        .args(&["run", "jobs", "--holder", "ci-7", "--", &bin, "status", "jobs"])
        .passes()
        .stdout_has("jobs: 1 live")
        .stdout_has("counting")
        .stdout_has("ci-7");
}

#[test]
fn pending_writer_without_leases_is_write_requested() {
    let temp = Workspace::empty();
    temp.file(
        "leases.json",
        r#"{"resources":{"schema":{"intent":{"token":"w1","expires_at":"2999-01-01T00:00:00Z","context":"migration"}}}}"#,
    );

    temp.dbsem()
        .args(&["status", "schema"])
        .passes()
        .stdout_has("schema: write-requested")
        .stdout_has("intent")
        .stdout_has("migration")
        .stdout_lacks("live");
}

#[test]
fn status_reads_do_not_create_the_store() {
    let temp = Workspace::empty();

    temp.dbsem().args(&["status", "jobs"]).passes();

    assert!(!temp.store_path().exists());
}

//! `dbsem run` specs: commands under a counting-semaphore slot

use crate::prelude::*;

#[test]
fn runs_the_command() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["run", "jobs", "--", "echo", "hello"])
        .passes()
        .stdout_eq("hello\n");
}

#[test]
fn passes_the_exit_status_through() {
    let temp = Workspace::empty();

    temp.dbsem()
        .args(&["run", "jobs", "--", "sh", "-c", "exit 3"])
        .exits_with(3);
}

#[test]
fn slot_is_released_afterwards() {
    let temp = Workspace::empty();
    temp.dbsem().args(&["run", "jobs", "--", "true"]).passes();

    temp.dbsem()
        .args(&["status", "jobs"])
        .passes()
        .stdout_eq("jobs: free\n");
}

#[test]
fn slot_is_released_after_failure() {
    let temp = Workspace::empty();
    temp.dbsem().args(&["run", "jobs", "--", "false"]).exits_with(1);

    temp.dbsem().args(&["run", "jobs", "--", "true"]).passes();
}

#[test]
fn busy_key_exits_unavailable_without_running() {
    let temp = Workspace::empty();
    let bin = dbsem_bin();
    let inner = format!("{bin} run jobs -- echo inner-ran; echo inner=$?");

    temp.dbsem()
        .args(&["run", "jobs", "--", "sh", "-c", &inner])
        .passes()
        .stdout_lacks("inner-ran")
        .stdout_has(&format!("inner={}", EXIT_UNAVAILABLE));
}

#[test]
fn max_flag_allows_concurrent_holders() {
    let temp = Workspace::empty();
    let bin = dbsem_bin();

    temp.dbsem()
        .args(&[
            "run", "jobs", "--max", "2", "--", &bin, "run", "jobs", "--max", "2", "--", "echo",
            "both",
        ])
        .passes()
        .stdout_has("both");
}

#[test]
fn configured_limit_applies_per_key() {
    let temp = Workspace::empty();
    let config = temp.file(
        "dbsem.toml",
        "[semaphores]\ndefault_max_concurrency = 1\n[semaphores.limits]\njobs = 2\n",
    );
    let bin = dbsem_bin();

    temp.dbsem()
        .env("DBSEM_CONFIG", config.to_str().unwrap())
        .args(&["run", "jobs", "--", &bin, "run", "jobs", "--", "echo", "both"])
        .passes()
        .stdout_has("both");
}

#[test]
fn different_keys_do_not_contend() {
    let temp = Workspace::empty();
    let bin = dbsem_bin();

    temp.dbsem()
        .args(&["run", "jobs", "--", &bin, "run", "reports", "--", "echo", "ok"])
        .passes()
        .stdout_has("ok");
}

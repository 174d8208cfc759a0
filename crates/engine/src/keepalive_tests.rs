// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn period_is_a_fraction_of_the_timeout() {
    assert_eq!(
        keepalive_period(Duration::from_secs(30), 3),
        Duration::from_secs(10)
    );
    assert_eq!(
        keepalive_period(Duration::from_nanos(2), 3),
        Duration::from_millis(1)
    );
    assert_eq!(
        keepalive_period(Duration::from_secs(4), 0),
        Duration::from_secs(4)
    );
}

#[tokio::test(start_paused = true)]
async fn extends_while_work_runs() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let output = with_keepalive(
        "K",
        async {
            tokio::time::sleep(Duration::from_millis(3500)).await;
            7
        },
        Duration::from_secs(1),
        || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        },
    )
    .await;

    assert_eq!(output, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn failed_extension_does_not_abort_work() {
    let output = with_keepalive(
        "K",
        async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            "done"
        },
        Duration::from_millis(500),
        || async {
            Err(LockError::NotFound {
                key: "K".to_string(),
                kind: dbsem_core::LockKind::Counting,
            })
        },
    )
    .await;

    assert_eq!(output, "done");
}

#[tokio::test]
async fn quick_work_never_extends() {
    let calls = AtomicUsize::new(0);
    let output = with_keepalive("K", async { 1 }, Duration::from_secs(60), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    })
    .await;

    assert_eq!(output, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

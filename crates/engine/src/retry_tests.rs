// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn delays_grow_until_capped() {
    let policy = RetryPolicy {
        initial: ms(100),
        max: ms(1000),
        multiplier: 2.0,
        deadline: None,
    };

    let delays: Vec<_> = policy.delays().take(6).collect();

    assert_eq!(delays, vec![ms(100), ms(200), ms(400), ms(800), ms(1000), ms(1000)]);
}

#[test]
fn delays_stay_inside_half_the_intent_ttl() {
    let policy = RetryPolicy {
        initial: Duration::from_secs(1),
        max: Duration::from_secs(60),
        multiplier: 10.0,
        deadline: None,
    };

    assert!(policy
        .delays()
        .take(10)
        .all(|d| d <= RetryPolicy::max_poll_delay()));
    assert!(RetryPolicy::max_poll_delay() < WRITE_INTENT_TTL);
}

#[test]
fn multiplier_below_one_does_not_shrink() {
    let policy = RetryPolicy {
        initial: ms(300),
        max: ms(1000),
        multiplier: 0.5,
        deadline: None,
    };

    assert!(policy.delays().take(5).all(|d| d == ms(300)));
}

#[test]
fn defaults_come_from_runner_config() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.initial, ms(100));
    assert_eq!(policy.max, Duration::from_secs(2));
    assert_eq!(policy.deadline, None);
    assert_eq!(
        policy.with_deadline(Duration::from_secs(5)).deadline,
        Some(Duration::from_secs(5))
    );
}

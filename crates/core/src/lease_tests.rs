// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn lease_token_renders_secret_then_slot() {
    let token = LeaseToken::new(3, "abc");
    assert_eq!(token.to_string(), "abc.3");
}

#[test]
fn lease_token_parses_uuid_secret() {
    let secret = uuid::Uuid::new_v4().to_string();
    let token: LeaseToken = format!("{}.12", secret).parse().unwrap();
    assert_eq!(token.slot(), 12);
    assert_eq!(token.secret(), secret);
}

#[test]
fn lease_token_keeps_dots_inside_secret() {
    let token: LeaseToken = "a.b.c.7".parse().unwrap();
    assert_eq!(token.secret(), "a.b.c");
    assert_eq!(token.slot(), 7);
}

#[parameterized(
    no_separator = { "abc" },
    empty_secret = { ".4" },
    bad_slot = { "abc.x" },
    negative_slot = { "abc.-1" },
)]
fn lease_token_rejects_malformed(input: &str) {
    assert!(input.parse::<LeaseToken>().is_err());
}

#[test]
fn request_token_matures_into_exclusive_slot() {
    let request = RequestToken::new("req");
    let lease = request.into_lease_token();
    assert_eq!(lease.slot(), EXCLUSIVE_SLOT);
    assert_eq!(lease.secret(), "req");
}

#[parameterized(
    empty = { "" },
    spaces = { "   " },
    tabs = { " \t" },
)]
fn blank_keys_are_rejected(key: &str) {
    assert!(matches!(
        validate_key(key),
        Err(LockError::InvalidArgument(_))
    ));
}

#[test]
fn zero_timeout_is_rejected() {
    assert!(validate_timeout(Duration::ZERO).is_err());
    assert!(validate_timeout(Duration::from_millis(1)).is_ok());
}

#[test]
fn context_at_max_length_is_accepted() {
    let context = "a".repeat(MAX_CONTEXT_CHARS);
    assert!(validate_context(&context).is_ok());
}

#[test]
fn context_over_limit_is_rejected() {
    let context = "a".repeat(MAX_CONTEXT_CHARS + 1);
    let err = validate_context(&context).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "invalid argument: context length cannot be more than: {}",
            MAX_CONTEXT_CHARS
        )
    );
}

#[test]
fn holder_for_process_includes_pid() {
    let holder = HolderId::for_process();
    assert!(holder
        .as_str()
        .ends_with(&format!(":{}", std::process::id())));
}

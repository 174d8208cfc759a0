// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn task(argv: &[&str]) -> CommandTask {
    CommandTask::new(argv.iter().map(|s| s.to_string()).collect()).unwrap()
}

#[test]
fn empty_command_is_rejected() {
    assert!(matches!(CommandTask::new(vec![]), Err(CommandError::Empty)));
}

#[tokio::test]
async fn successful_command() {
    task(&["true"]).run().await.unwrap();
}

#[tokio::test]
async fn exit_status_is_reported() {
    let err = task(&["sh", "-c", "exit 3"]).run().await.unwrap_err();

    match err {
        CommandError::Exit { program, code } => {
            assert_eq!(program, "sh");
            assert_eq!(code, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_program_fails_to_spawn() {
    let err = task(&["dbsem-no-such-program"]).run().await.unwrap_err();

    assert!(matches!(err, CommandError::Spawn { .. }));
}

//! Shared helpers for CLI specs

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use std::process::Output;
use tempfile::TempDir;

/// Exit status for a lock held elsewhere
pub const EXIT_UNAVAILABLE: i32 = 75;

/// A temp dir holding one lease table
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("leases.json")
    }

    /// Write a file relative to the workspace and return its path
    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// dbsem pointed at this workspace's store; children inherit it
    pub fn dbsem(&self) -> CliBuilder {
        let mut cmd = Command::cargo_bin("dbsem").unwrap();
        cmd.env("DBSEM_STORE", self.store_path())
            .env_remove("DBSEM_CONFIG")
            .env_remove("RUST_LOG");
        CliBuilder { cmd }
    }
}

/// Path of the built binary, for nesting dbsem inside a locked command
pub fn dbsem_bin() -> String {
    assert_cmd::cargo::cargo_bin("dbsem")
        .to_string_lossy()
        .into_owned()
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn passes(self) -> RunAssert {
        self.exits_with(0)
    }

    pub fn fails(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        assert!(
            !output.status.success(),
            "expected failure, got success\nstdout: {}",
            String::from_utf8_lossy(&output.stdout)
        );
        RunAssert { output }
    }

    pub fn exits_with(mut self, code: i32) -> RunAssert {
        let output = self.cmd.output().unwrap();
        assert_eq!(
            output.status.code(),
            Some(code),
            "unexpected exit status\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain {:?}\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout unexpectedly contains {:?}\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain {:?}\nstderr: {}",
            expected,
            stderr
        );
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }
}

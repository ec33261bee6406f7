//! Shared harness for the minigit integration tests.
//!
//! Identity and dates are pinned through the environment so object ids
//! are stable across machines.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Stdio};

/// Captured output from running a command.
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

fn pin_env(cmd: &mut Command) {
    cmd.env("GIT_AUTHOR_NAME", "Test Author")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_AUTHOR_DATE", "1234567890 +0000")
        .env("GIT_COMMITTER_NAME", "Test Committer")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_DATE", "1234567890 +0000")
        .env_remove("RUST_LOG");
}

/// Run minigit in `dir` with the given arguments.
pub fn minigit(dir: &Path, args: &[&str]) -> CommandResult {
    minigit_with_stdin(dir, args, b"")
}

/// Run minigit in `dir`, feeding `stdin` to the process.
pub fn minigit_with_stdin(dir: &Path, args: &[&str], stdin: &[u8]) -> CommandResult {
    use std::io::Write;

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_minigit"));
    cmd.args(args)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    pin_env(&mut cmd);
    let mut child = cmd.spawn().expect("failed to run minigit");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin)
        .expect("failed to write stdin");
    let output = child.wait_with_output().expect("failed to wait for minigit");
    CommandResult {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(128),
    }
}

/// Run minigit and assert it succeeded, returning stdout.
pub fn ok(dir: &Path, args: &[&str]) -> String {
    let result = minigit(dir, args);
    assert_eq!(
        result.exit_code, 0,
        "minigit {args:?} failed:\n{}",
        result.stderr
    );
    result.stdout
}

/// A fresh repository in a temporary directory.
pub fn setup_empty_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    ok(dir.path(), &["init", "-q"]);
    dir
}

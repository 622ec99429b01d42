//! Tests for stdin input handling
//!
//! Tests that verify the shell correctly handles multi-line input when
//! reading from stdin (non-interactive mode).

#![cfg(unix)]
#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use anyhow::Context;
use std::io::Write;
use std::process::{Command, Output, Stdio};

fn run_with_stdin(input: &[u8]) -> anyhow::Result<Output> {
    let shell_path = assert_cmd::cargo::cargo_bin!("hush");

    let mut child = Command::new(shell_path)
        .arg("--no-config")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to spawn hush")?;

    let stdin = child.stdin.as_mut().context("Failed to open stdin")?;
    stdin.write_all(input)?;
    drop(child.stdin.take());

    child.wait_with_output().context("Failed to wait for hush")
}

/// Test that multi-line input with continuation (e.g., && at end of line) works correctly
/// when piped to the shell.
#[test]
fn multiline_continuation_via_stdin() -> anyhow::Result<()> {
    let output = run_with_stdin(b"echo one &&\necho two\nfalse ||\necho fallback\n")?;

    assert!(
        output.status.success(),
        "hush should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8(output.stdout)?, "one\ntwo\nfallback\n");

    Ok(())
}

/// Compound statements may span lines, and a backslash-newline joins lines.
#[test]
fn compound_statements_via_stdin() -> anyhow::Result<()> {
    let output = run_with_stdin(
        b"for x in a \\\n b\ndo\n  if true\n  then\n    echo $x\n  fi\ndone\n",
    )?;

    assert!(
        output.status.success(),
        "hush should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8(output.stdout)?, "a\nb\n");

    Ok(())
}

/// A syntax error only discards the statement it occurs in.
#[test]
fn syntax_error_recovery_via_stdin() -> anyhow::Result<()> {
    let output = run_with_stdin(b"echo before\nthen echo bad\necho after\n")?;

    assert_eq!(String::from_utf8(output.stdout)?, "before\nafter\n");
    assert!(String::from_utf8_lossy(&output.stderr).contains("hush: syntax error"));

    Ok(())
}

/// Input ending in the middle of a statement is reported, and whatever ran
/// before is kept.
#[test]
fn unexpected_end_of_input() -> anyhow::Result<()> {
    let output = run_with_stdin(b"echo start\nif true; then\necho inside\n")?;

    assert_eq!(String::from_utf8(output.stdout)?, "start\n");
    assert_eq!(output.status.code(), Some(1));

    Ok(())
}

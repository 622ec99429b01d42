//! End-to-end tests running the `hush` binary against command strings and
//! scripts.

#![cfg(unix)]
#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use std::io::Write;

use anyhow::Result;
use predicates::prelude::*;

fn hush() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("hush"));
    cmd.arg("--no-config");
    cmd
}

fn run(script: &str) -> assert_cmd::assert::Assert {
    hush().arg("-c").arg(script).assert()
}

#[test]
fn simple_command() {
    run("echo hello world").success().stdout("hello world\n");
}

#[test]
fn pipelines_connect_stages() {
    run("echo one two | tr a-z A-Z | tr O 0")
        .success()
        .stdout("0NE TW0\n");
}

#[test]
fn quoting_and_field_splitting() {
    run(r#"A="x  y"; echo $A; echo "$A"; echo '$A'; echo a\ b"c"d"#)
        .success()
        .stdout("x y\nx  y\n$A\na bcd\n");
}

#[test]
fn command_substitution_keeps_trailing_newline() {
    run(r#"echo "[$(echo hi)]"; X=`echo a b`; echo $X"#)
        .success()
        .stdout("[hi\n]\na b\n");
}

#[test]
fn exit_status_of_last_command() {
    run("true; false").code(1);
    run("false; true").success();
    run("false; echo $?").success().stdout("1\n");
    run("exit 3").code(3);
    run("exit 259").code(3);
}

#[test]
fn invalid_exit_argument() {
    run("exit abc")
        .code(255)
        .stderr(predicate::str::contains("hush: exit: invalid number 'abc'"));
}

#[test]
fn exit_ignores_extra_operands() {
    run("exit 1 2; echo x").code(1).stdout("");
    run("exit -1; echo x").code(255).stdout("");
}

#[test]
fn and_or_lists() {
    run("true && echo a || echo b").success().stdout("a\n");
    run("false && echo a || echo b").success().stdout("b\n");
    run("true || echo a || echo b; echo c").success().stdout("c\n");
    run("true || echo a && echo b").success().stdout("b\n");
}

#[test]
fn if_statements() {
    run("if false; then echo a; elif true; then echo b; else echo c; fi")
        .success()
        .stdout("b\n");
    run("if false; then echo a; else echo c; fi; echo done")
        .success()
        .stdout("c\ndone\n");
}

#[test]
fn loops() {
    run("for x in a b c; do echo $x; done; echo last=$x")
        .success()
        .stdout("a\nb\nc\nlast=c\n");
    run("for x in a b; do for y in 1 2; do echo $x$y; done; done")
        .success()
        .stdout("a1\na2\nb1\nb2\n");
    run("for x\nin a b\ndo echo $x\ndone")
        .success()
        .stdout("a\nb\n");
}

#[test]
fn while_loop_reads_lines() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("input.txt");
    std::fs::write(&input, "first\nsecond\n")?;

    hush()
        .current_dir(dir.path())
        .arg("-c")
        .arg("while read LINE; do echo got $LINE; done < input.txt")
        .assert()
        .success()
        .stdout("got first\ngot second\n");
    Ok(())
}

#[test]
fn until_loop() {
    run("A=; until test -n \"$A\"; do echo once; A=x; done")
        .success()
        .stdout("once\n");
}

#[test]
fn redirections() -> Result<()> {
    let dir = tempfile::tempdir()?;

    hush()
        .current_dir(dir.path())
        .arg("-c")
        .arg("echo one > out; echo two >> out; cat < out; cat missing 2>&1 >/dev/null | grep -c missing")
        .assert()
        .success()
        .stdout("one\ntwo\n1\n");

    assert_eq!(std::fs::read_to_string(dir.path().join("out"))?, "one\ntwo\n");
    Ok(())
}

#[test]
fn failed_redirection() {
    run("echo hi < /nonexistent/file; echo after")
        .success()
        .stdout("after\n")
        .stderr(predicate::str::contains("/nonexistent/file"));
}

#[test]
fn here_documents_are_unsupported() {
    run("cat << EOF")
        .code(1)
        .stderr(predicate::str::contains("here-documents are not supported"));
}

#[test]
fn command_not_found() {
    run("definitely-not-a-command-xyz")
        .code(127)
        .stderr(predicate::str::contains(
            "hush: cannot exec 'definitely-not-a-command-xyz': not found",
        ));
}

#[test]
fn positional_parameters_with_command_string() {
    hush()
        .args(["-c", "echo $0 $1 $2 $#; shift; echo $*", "name", "one", "two"])
        .assert()
        .success()
        .stdout("name one two 2\ntwo\n");
}

#[test]
fn scripts_receive_arguments() -> Result<()> {
    let mut script = tempfile::NamedTempFile::new()?;
    writeln!(script, "echo $# $1")?;
    writeln!(script, "for arg in $*; do echo \"[$arg]\"; done")?;

    hush()
        .arg(script.path())
        .args(["a", "b"])
        .assert()
        .success()
        .stdout("2 a\n[a]\n[b]\n");
    Ok(())
}

#[test]
fn syntax_errors_are_reported() {
    run("echo \"abc")
        .code(1)
        .stderr(predicate::str::contains("hush: syntax error"));
}

#[test]
fn fake_mode_does_not_execute() {
    hush()
        .args(["-f", "-c", "echo hi"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn groups() {
    run("(A=1; echo in $A); echo \"[$A]\"")
        .success()
        .stdout("in 1\n[]\n");
    run("{ A=1; echo in $A; }; echo \"[$A]\"")
        .success()
        .stdout("in 1\n[1]\n");
    run("{ echo a; echo b; } | wc -l | tr -d ' '")
        .success()
        .stdout("2\n");
}

#[test]
fn pathname_expansion() -> Result<()> {
    let dir = tempfile::tempdir()?;
    for name in ["b.txt", "a.txt", "c.log", ".hidden.txt"] {
        std::fs::write(dir.path().join(name), "")?;
    }

    hush()
        .current_dir(dir.path())
        .arg("-c")
        .arg("echo *.txt; echo '*.txt'; echo *.none")
        .assert()
        .success()
        .stdout("a.txt b.txt\n*.txt\n*.none\n");
    Ok(())
}

#[test]
fn assignments_and_environment() {
    run("FOO=bar printenv FOO; echo \"[$FOO]\"")
        .success()
        .stdout("bar\n[]\n");
    run("X=1; printenv X || echo unexported; export X; printenv X")
        .success()
        .stdout("unexported\n1\n");
    run("export Y=2; Y=3; printenv Y").success().stdout("3\n");
}

#[test]
fn readonly_version_variable() {
    run("echo $HUSH_VERSION; unset HUSH_VERSION")
        .code(1)
        .stdout("0.01\n")
        .stderr(predicate::str::contains(
            "hush: unset: HUSH_VERSION: readonly variable",
        ));
}

#[test]
fn eval_and_dot() -> Result<()> {
    let mut sourced = tempfile::NamedTempFile::new()?;
    writeln!(sourced, "B=from-file")?;
    let path = sourced
        .path()
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("non-UTF-8 temp path"))?
        .to_owned();

    run(&format!("eval 'A=5; echo $A'; . {path}; echo $B"))
        .success()
        .stdout("5\nfrom-file\n");

    run(". /nonexistent/file")
        .code(1)
        .stderr(predicate::str::contains(
            "hush: .: cannot open '/nonexistent/file'",
        ));
    Ok(())
}

#[test]
fn cd_and_pwd() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let canonical = dir.path().canonicalize()?;
    let canonical = canonical
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("non-UTF-8 temp path"))?;

    run(&format!("cd {canonical}; pwd"))
        .success()
        .stdout(format!("{canonical}\n"));

    run("cd /nonexistent/dir")
        .code(1)
        .stderr(predicate::str::contains("hush: cd: /nonexistent/dir:"));
    Ok(())
}

#[test]
fn exec_builtin() -> Result<()> {
    run("exec echo replaced; echo never")
        .success()
        .stdout("replaced\n");

    let dir = tempfile::tempdir()?;
    hush()
        .current_dir(dir.path())
        .arg("-c")
        .arg("exec > out; echo captured")
        .assert()
        .success()
        .stdout("");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out"))?,
        "captured\n"
    );
    Ok(())
}

#[test]
fn umask_builtin() {
    run("umask 027; umask").success().stdout("027\n");
}

#[test]
fn help_lists_builtins() {
    run("help")
        .success()
        .stdout(predicate::str::starts_with("\nBuilt-in commands:\n-------------------\n"))
        .stdout(predicate::str::contains("cd\tChange working directory\n"))
        .stdout(predicate::str::contains("umask\tSets file creation mask\n"))
        .stdout(predicate::str::ends_with(
            ".\tSource-in and run commands in a file\nhelp\tList shell built-in commands\n\n\n",
        ));
}

#[test]
fn help_for_named_builtins() {
    run("help cd")
        .success()
        .stdout(predicate::str::contains("Change working directory"))
        .stdout(predicate::str::contains("Usage: cd"));
    run("help no-such-builtin")
        .code(1)
        .stderr(predicate::str::contains(
            "hush: help: no help topics match 'no-such-builtin'",
        ));
}

#[test]
fn unimplemented_builtins() {
    run("break")
        .code(1)
        .stderr(predicate::str::contains("hush: break: not implemented"));
}

#[test]
fn background_jobs() {
    run("sleep 0 & echo started; test $! -gt 0 && echo pid")
        .success()
        .stdout("started\npid\n");
}

#[test]
fn job_control_requires_interactive_shell() {
    run("fg")
        .code(1)
        .stderr(predicate::str::contains("hush: fg: job control is not enabled"));
}

#[test]
fn builtins_in_pipelines() {
    run("pwd | wc -l | tr -d ' '").success().stdout("1\n");
    run("A=1 | true; echo \"[$A]\"").success().stdout("[]\n");
}

//! Executes parsed command lists: control flow, pipelines and the process
//! plumbing between their stages.

use std::collections::VecDeque;
use std::os::fd::AsRawFd;

use hush_parser::ast::{Command, CommandKind, CommandList, Followup, Pipe, ReservedWord};

use crate::commands::{self, ExpandedCommand};
use crate::expansion;
use crate::jobs::Job;
use crate::openfiles::{self, SavedRedirects};
use crate::sys::process::{Forked, ProcessId};
use crate::{Shell, error, sys, trace_categories};

/// Control-flow bookkeeping for one walk over a command list.
#[derive(Default)]
struct ListState {
    /// Index of the pipe that opened the current loop.
    loop_start: Option<usize>,
    /// Whether the current loop body should run (again).
    repeat: bool,
    /// Values still to be bound by the current `for` loop.
    for_items: Option<VecDeque<String>>,
    /// Status deciding whether the current `then`/`else` branch runs.
    if_code: u8,
    /// Status of the most recent `if`/`elif` condition.
    next_if_code: u8,
    /// Role and operator of a `&&`/`||` chain being skipped.
    skipping: Option<(Option<ReservedWord>, Followup)>,
}

/// Runs every pipe of a command list, honoring the reserved-word roles of its
/// pipes. Returns the status of the last pipe that ran.
///
/// Errors from individual commands are reported and become their status; only
/// errors that leave the shell unable to continue are returned.
pub(crate) fn run_list(shell: &mut Shell, list: &CommandList) -> Result<u8, error::Error> {
    let mut state = ListState::default();
    let mut status = 0;
    let mut next = 0;

    while let Some(pipe) = list.pipes.get(next) {
        if shell.exit_requested() {
            break;
        }

        let index = next;
        next += 1;
        let role = pipe.role;

        if let Some((skip_role, operator)) = state.skipping {
            if skip_role == role {
                if pipe.followup != operator {
                    state.skipping = None;
                }
                continue;
            }
            state.skipping = None;
        }

        if matches!(
            role,
            Some(ReservedWord::While | ReservedWord::Until | ReservedWord::For)
        ) && state.loop_start.is_none()
        {
            state.loop_start = Some(index);
            state.repeat = false;
        }

        if matches!(role, Some(ReservedWord::Then | ReservedWord::Else)) {
            state.if_code = state.next_if_code;
        }

        match role {
            Some(ReservedWord::Then) if state.if_code != 0 => continue,
            Some(ReservedWord::Else) if state.if_code == 0 => continue,
            Some(ReservedWord::Elif) if state.if_code == 0 => break,
            Some(ReservedWord::In) => continue,
            Some(ReservedWord::Do) if !state.repeat => continue,
            Some(ReservedWord::Done) => {
                match state.loop_start {
                    Some(start) if state.repeat => next = start,
                    _ => state.loop_start = None,
                }
                continue;
            }
            Some(ReservedWord::For) => {
                if let Some(for_status) = advance_for_loop(shell, list, index, &mut state) {
                    status = for_status;
                    shell.last_exit_status = status;
                }
                continue;
            }
            _ => (),
        }

        if pipe.commands.is_empty() {
            continue;
        }

        status = match run_pipe(shell, pipe) {
            Ok(status) => status,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => shell.report_error(&e),
        };
        shell.last_exit_status = status;

        match role {
            Some(ReservedWord::If | ReservedWord::Elif) => state.next_if_code = status,
            Some(ReservedWord::While) => state.repeat = status == 0,
            Some(ReservedWord::Until) => state.repeat = status != 0,
            _ => (),
        }

        if (status == 0 && pipe.followup == Followup::Or)
            || (status != 0 && pipe.followup == Followup::And)
        {
            state.skipping = Some((role, pipe.followup));
        }

        shell.reap_background_jobs();
    }

    Ok(status)
}

/// Binds the next value of the `for` loop whose header is at `index`,
/// computing the value list on the first pass. Returns the status to record
/// when a value was bound or the list failed to expand.
fn advance_for_loop(
    shell: &mut Shell,
    list: &CommandList,
    index: usize,
    state: &mut ListState,
) -> Option<u8> {
    let name = list
        .pipes
        .get(index)
        .and_then(|pipe| pipe.commands.first())
        .and_then(|command| command.words().first())
        .and_then(|word| word.as_plain_text())?;

    if state.for_items.is_none() {
        let words = list
            .pipes
            .get(index + 1)
            .and_then(|pipe| pipe.commands.first())
            .map(Command::words)
            .unwrap_or_default();
        if words.is_empty() {
            return None;
        }

        let values = match expansion::expand_words(shell, words) {
            Ok(values) => values,
            Err(e) => return Some(shell.report_error(&e)),
        };
        let ifs = shell.ifs().into_owned();
        state.for_items = Some(
            values
                .iter()
                .flat_map(|value| expansion::split_fields(value, &ifs))
                .collect(),
        );
        state.repeat = true;
    }

    let Some(value) = state.for_items.as_mut().and_then(VecDeque::pop_front) else {
        state.for_items = None;
        state.repeat = false;
        return None;
    };

    tracing::debug!(target: trace_categories::COMMANDS, "for: {name}={value}");
    match shell.env.set(name, value, false) {
        Ok(()) => Some(0),
        Err(e) => {
            state.for_items = None;
            state.repeat = false;
            Some(shell.report_error(&e))
        }
    }
}

/// Outcome of trying to run a single command without forking.
enum InProcess {
    /// The command ran; here's its status.
    Done(u8),
    /// The command needs a child process; its words may already be expanded.
    Spawn(Option<ExpandedCommand>),
}

fn run_pipe(shell: &mut Shell, pipe: &Pipe) -> Result<u8, error::Error> {
    let background = pipe.followup == Followup::Background;

    let mut expanded = None;
    if let ([command], false) = (pipe.commands.as_slice(), background) {
        match run_in_process(shell, command)? {
            InProcess::Done(status) => return Ok(status),
            InProcess::Spawn(pre_expanded) => expanded = pre_expanded,
        }
    }

    spawn_pipeline(shell, pipe, background, expanded)
}

/// Runs brace groups, bare assignments and builtins inside the shell itself,
/// so that their effects on the shell's state persist.
fn run_in_process(shell: &mut Shell, command: &Command) -> Result<InProcess, error::Error> {
    match &command.kind {
        CommandKind::Group { subshell: true, .. } => Ok(InProcess::Spawn(None)),
        CommandKind::Group {
            list,
            subshell: false,
        } => {
            let mut saved = SavedRedirects::default();
            openfiles::apply_redirects(shell, &command.redirects, Some(&mut saved))?;
            Ok(InProcess::Done(run_list(shell, list)?))
        }
        CommandKind::Simple(words) => {
            let expanded = commands::expand_simple_command(shell, words)?;

            let Some(name) = expanded.name() else {
                let mut saved = SavedRedirects::default();
                openfiles::apply_redirects(shell, &command.redirects, Some(&mut saved))?;
                commands::apply_assignments(shell, &expanded.assignments, false)?;
                return Ok(InProcess::Done(0));
            };

            let Some(registration) = shell.builtin(name) else {
                return Ok(InProcess::Spawn(Some(expanded)));
            };

            // A bare `exec` makes its redirections permanent.
            if name == "exec" && expanded.args.len() == 1 {
                openfiles::apply_redirects(shell, &command.redirects, None)?;
                commands::apply_assignments(shell, &expanded.assignments, true)?;
                return Ok(InProcess::Done(0));
            }

            commands::apply_assignments(shell, &expanded.assignments, true)?;
            let mut saved = SavedRedirects::default();
            openfiles::apply_redirects(shell, &command.redirects, Some(&mut saved))?;
            Ok(InProcess::Done(commands::execute_builtin(
                shell,
                registration,
                expanded.args,
            )))
        }
    }
}

/// Forks one child per stage of the pipe, connecting consecutive stages with
/// pipes, then either waits for the resulting job or leaves it running in the
/// background.
fn spawn_pipeline(
    shell: &mut Shell,
    pipe: &Pipe,
    background: bool,
    mut expanded: Option<ExpandedCommand>,
) -> Result<u8, error::Error> {
    let job_control = shell.job_control_enabled();
    let last_stage = pipe.commands.len().saturating_sub(1);

    let mut pgid: Option<ProcessId> = None;
    let mut pids = vec![];
    let mut stdin: Option<os_pipe::PipeReader> = None;

    for (stage, command) in pipe.commands.iter().enumerate() {
        let (next_stdin, stdout) = if stage < last_stage {
            let (reader, writer) = os_pipe::pipe().map_err(error::Error::PipeCreationFailed)?;
            (Some(reader), Some(writer))
        } else {
            (None, None)
        };

        match sys::process::fork()? {
            Forked::Child => {
                drop(next_stdin);
                let setup = StageSetup {
                    pgid,
                    background,
                    stdin: stdin.take(),
                    stdout,
                };
                let status = run_stage_in_child(shell, command, setup, expanded.take());
                sys::process::exit_child(status);
            }
            Forked::Parent(pid) => {
                let group = *pgid.get_or_insert(pid);
                if job_control {
                    // The child races us to join; whichever loses may fail.
                    if let Err(e) = sys::signal::join_process_group(pid, group) {
                        tracing::debug!(target: trace_categories::JOBS, "setpgid({pid}): {e}");
                    }
                }
                pids.push(pid);
                drop(stdout);
                stdin = next_stdin;
            }
        }
    }

    let Some(pgid) = pgid else {
        return Ok(0);
    };

    let job = Job::new(pgid, pids, pipe.to_string());
    if background {
        shell.add_background_job(job);
        Ok(0)
    } else {
        shell.wait_for_foreground(job)
    }
}

/// What a forked pipeline stage inherits from the shell that forked it.
struct StageSetup {
    pgid: Option<ProcessId>,
    background: bool,
    stdin: Option<os_pipe::PipeReader>,
    stdout: Option<os_pipe::PipeWriter>,
}

/// Prepares a freshly forked child and runs one stage in it, returning the
/// status the child should exit with.
fn run_stage_in_child(
    shell: &mut Shell,
    command: &Command,
    setup: StageSetup,
    expanded: Option<ExpandedCommand>,
) -> u8 {
    if shell.job_control_enabled() {
        let group = setup.pgid.unwrap_or_else(sys::process::current_pid);
        if let Err(e) = sys::signal::join_process_group(ProcessId::from_raw(0), group) {
            tracing::debug!(target: trace_categories::JOBS, "setpgid: {e}");
        }
        if !setup.background
            && let Some(terminal) = shell.terminal()
            && let Err(e) = terminal.give_to(group)
        {
            tracing::debug!(target: trace_categories::TERMINAL, "tcsetpgrp: {e}");
        }
    }
    shell.enter_subshell();

    if let Err(e) = sys::signal::restore_default_signals() {
        return shell.report_error(&e);
    }

    if let Some(reader) = setup.stdin {
        if let Err(e) = sys::fd::duplicate_onto(reader.as_raw_fd(), 0) {
            return shell.report_error(&e);
        }
    }
    if let Some(writer) = setup.stdout {
        if let Err(e) = sys::fd::duplicate_onto(writer.as_raw_fd(), 1) {
            return shell.report_error(&e);
        }
    }

    match run_stage(shell, command, expanded) {
        Ok(status) => status,
        Err(e) => shell.report_error(&e),
    }
}

fn run_stage(
    shell: &mut Shell,
    command: &Command,
    expanded: Option<ExpandedCommand>,
) -> Result<u8, error::Error> {
    openfiles::apply_redirects(shell, &command.redirects, None)?;

    let words = match &command.kind {
        CommandKind::Group { list, .. } => return run_list(shell, list),
        CommandKind::Simple(words) => words,
    };

    let expanded = match expanded {
        Some(expanded) => expanded,
        None => commands::expand_simple_command(shell, words)?,
    };

    let Some(name) = expanded.name() else {
        commands::apply_assignments(shell, &expanded.assignments, false)?;
        return Ok(0);
    };

    if let Some(registration) = shell.builtin(name) {
        commands::apply_assignments(shell, &expanded.assignments, true)?;
        return Ok(commands::execute_builtin(shell, registration, expanded.args));
    }

    let error = commands::exec_external(shell, &expanded);
    Ok(commands::report_exec_failure(name, &error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    // Builtins standing in for `false` and `true`, so that no test forks.
    const FAIL: &str = "shift 99";
    const SUCCEED: &str = "unset UNUSED";

    fn run(script: &str) -> Result<Shell> {
        let mut shell = Shell::new(crate::CreateOptions {
            do_not_inherit_env: true,
            ..crate::CreateOptions::default()
        })?;
        shell.run_string(script)?;
        Ok(shell)
    }

    fn var<'a>(shell: &'a Shell, name: &str) -> Result<&'a str> {
        shell
            .env
            .get_str(name)
            .ok_or_else(|| anyhow::anyhow!("{name} is not set"))
    }

    #[test]
    fn for_loop_binds_each_value() -> Result<()> {
        let shell = run("L=; for x in a 'b c' d; do L=$L-$x; done")?;
        assert_eq!(var(&shell, "L")?, "-a-b-c-d");
        assert_eq!(var(&shell, "x")?, "d");
        Ok(())
    }

    #[test]
    fn for_loop_without_values_does_nothing() -> Result<()> {
        let shell = run("E=; L=none; for x in $E; do L=some; done")?;
        assert_eq!(var(&shell, "L")?, "none");
        assert!(shell.env.get("x").is_none());
        Ok(())
    }

    #[test]
    fn for_loop_keeps_export_flag() -> Result<()> {
        let shell = run("export x=0; for x in 1 2; do Y=$x; done")?;
        let x = shell
            .env
            .get("x")
            .ok_or_else(|| anyhow::anyhow!("x is not set"))?;
        assert!(x.is_exported());
        assert_eq!(x.value(), "2");
        Ok(())
    }

    #[test]
    fn while_loop_runs_until_condition_fails() -> Result<()> {
        let mut shell = Shell::new(crate::CreateOptions {
            do_not_inherit_env: true,
            positional_parameters: vec!["a".into(), "b".into(), "c".into()],
            ..crate::CreateOptions::default()
        })?;
        shell.run_string("L=; while shift; do L=$L$#; done")?;
        assert_eq!(var(&shell, "L")?, "210");
        Ok(())
    }

    #[test]
    fn until_loop_runs_until_condition_succeeds() -> Result<()> {
        let shell = run(&format!(
            "C=; CMD='{FAIL}'; until eval $CMD; do C=x$C; CMD='{SUCCEED}'; done"
        ))?;
        assert_eq!(var(&shell, "C")?, "x");
        Ok(())
    }

    #[test]
    fn if_chains_pick_one_branch() -> Result<()> {
        let shell = run(&format!(
            "if {FAIL}; then R=a; elif {SUCCEED}; then R=b; else R=c; fi"
        ))?;
        assert_eq!(var(&shell, "R")?, "b");

        let shell = run(&format!("if {FAIL}; then R=a; elif {FAIL}; then R=b; else R=c; fi"))?;
        assert_eq!(var(&shell, "R")?, "c");

        let shell = run(&format!("if {SUCCEED}; then R=a; elif {SUCCEED}; then R=b; fi"))?;
        assert_eq!(var(&shell, "R")?, "a");
        Ok(())
    }

    #[test]
    fn and_or_chains() -> Result<()> {
        let shell = run(&format!("{FAIL} && A=1 || B=2"))?;
        assert!(shell.env.get("A").is_none());
        assert_eq!(var(&shell, "B")?, "2");

        let shell = run(&format!("{SUCCEED} || A=1 || B=2; C=3"))?;
        assert!(shell.env.get("A").is_none());
        assert!(shell.env.get("B").is_none());
        assert_eq!(var(&shell, "C")?, "3");

        let shell = run(&format!("{SUCCEED} || A=1 && B=2"))?;
        assert!(shell.env.get("A").is_none());
        assert_eq!(var(&shell, "B")?, "2");
        Ok(())
    }

    #[test]
    fn status_of_last_command() -> Result<()> {
        let shell = run(FAIL)?;
        assert_eq!(shell.last_exit_status, 1);

        let shell = run(&format!("{FAIL}; S=$?; {SUCCEED}"))?;
        assert_eq!(var(&shell, "S")?, "1");
        assert_eq!(shell.last_exit_status, 0);
        Ok(())
    }

    #[test]
    fn brace_groups_share_the_shell() -> Result<()> {
        let shell = run("{ A=1; B=2; }")?;
        assert_eq!(var(&shell, "A")?, "1");
        assert_eq!(var(&shell, "B")?, "2");
        Ok(())
    }

    #[test]
    fn exit_stops_the_list() -> Result<()> {
        let shell = run("A=1; exit 3; A=2")?;
        assert!(shell.exit_requested());
        assert_eq!(shell.last_exit_status, 3);
        assert_eq!(var(&shell, "A")?, "1");
        Ok(())
    }

    #[test]
    fn builtin_redirection_to_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.txt");
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("non-UTF-8 temp path"))?;

        let shell = run(&format!("umask 022 > {path_str}; umask >> {path_str}"))?;
        assert_eq!(shell.last_exit_status, 0);
        assert_eq!(std::fs::read_to_string(&path)?, "022\n");
        Ok(())
    }
}

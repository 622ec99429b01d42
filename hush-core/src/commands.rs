use std::path::PathBuf;

use hush_parser::word::Word;
use indexmap::IndexMap;

use crate::builtins;
use crate::expansion;
use crate::pathsearch;
use crate::shell::Shell;
use crate::{error, sys, trace_categories};

/// Search path used when `PATH` isn't set.
const DEFAULT_PATH: &str = "/bin:/usr/bin";

/// Represents the context for executing a command.
pub struct ExecutionContext<'a> {
    /// The shell in which the command is being executed.
    pub shell: &'a mut Shell,
    /// The name of the command being executed.
    pub command_name: String,
}

impl ExecutionContext<'_> {
    /// Returns the standard output file; usable with `write!` et al.
    pub fn stdout(&self) -> std::io::Stdout {
        std::io::stdout()
    }

    /// Returns the standard error file; usable with `write!` et al.
    pub fn stderr(&self) -> std::io::Stderr {
        std::io::stderr()
    }
}

/// A simple command after expansion: its leading `NAME=value` assignments
/// and its arguments, starting with the command name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ExpandedCommand {
    pub assignments: Vec<(String, String)>,
    pub args: Vec<String>,
}

impl ExpandedCommand {
    pub fn name(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

/// Expands the words of a simple command.
pub(crate) fn expand_simple_command(
    shell: &mut Shell,
    words: &[Word],
) -> Result<ExpandedCommand, error::Error> {
    let mut expanded = ExpandedCommand::default();

    let mut remaining = words;
    while let Some((first, rest)) = remaining.split_first() {
        let Some((name, value)) = first.split_assignment() else {
            break;
        };

        let value = expansion::expand_to_string(shell, &value)?;
        expanded.assignments.push((name.to_owned(), value));
        remaining = rest;
    }

    expanded.args = expansion::expand_words(shell, remaining)?;

    Ok(expanded)
}

/// Applies assignments to the shell's variables. Variables keep an existing
/// export flag; `export` adds it.
pub(crate) fn apply_assignments(
    shell: &mut Shell,
    assignments: &[(String, String)],
    export: bool,
) -> Result<(), error::Error> {
    for (name, value) in assignments {
        shell.env.set(name, value.as_str(), export)?;
    }
    Ok(())
}

/// Runs a builtin in the current process, returning its exit status.
/// Failures are reported on stderr.
pub(crate) fn execute_builtin(
    shell: &mut Shell,
    registration: builtins::Registration,
    args: Vec<String>,
) -> u8 {
    let command_name = args.first().cloned().unwrap_or_default();

    tracing::debug!(target: trace_categories::COMMANDS, "running builtin: {args:?}");

    let context = ExecutionContext {
        shell: &mut *shell,
        command_name: command_name.clone(),
    };

    match (registration.execute_func)(context, args) {
        Ok(result) => match result.exit_code {
            builtins::ExitCode::Success => 0,
            builtins::ExitCode::InvalidUsage => 2,
            builtins::ExitCode::Custom(status) => status,
            builtins::ExitCode::ExitShell(status) => {
                shell.request_exit();
                status
            }
        },
        Err(e) => {
            eprintln!("hush: {command_name}: {e}");
            e.exit_status()
        }
    }
}

/// Replaces the current process with the external command. Only returns on
/// failure.
pub(crate) fn exec_external(shell: &Shell, command: &ExpandedCommand) -> error::Error {
    let Some(name) = command.name() else {
        return error::Error::InvalidArguments;
    };

    let path = if name.contains('/') {
        PathBuf::from(name)
    } else {
        let search_path = shell.env.get_str("PATH").unwrap_or(DEFAULT_PATH);
        match pathsearch::search_for_executable(search_path.split(':'), name).next() {
            Some(path) => path,
            None => return error::Error::CommandNotFound(name.to_owned()),
        }
    };

    tracing::debug!(target: trace_categories::COMMANDS, "exec'ing {}", path.display());

    let env = compose_environment(shell, &command.assignments);
    sys::process::exec(&path, &command.args, &env)
}

/// Reports a failure to exec `name`, returning the status the child should
/// exit with.
pub(crate) fn report_exec_failure(name: &str, error: &error::Error) -> u8 {
    let (status, reason) = match error {
        error::Error::CommandNotFound(_) | error::Error::ErrnoError(nix::errno::Errno::ENOENT) => {
            (127, "not found".to_owned())
        }
        error::Error::ErrnoError(errno) => (126, errno.desc().to_owned()),
        other => (126, other.to_string()),
    };

    eprintln!("hush: cannot exec '{name}': {reason}");
    status
}

/// Builds the `NAME=value` environment for an external command: the shell's
/// exported variables, overridden by the command's own assignments.
fn compose_environment(shell: &Shell, assignments: &[(String, String)]) -> Vec<String> {
    let mut env: IndexMap<&str, &str> = shell
        .env
        .iter_exported()
        .map(|(name, var)| (name.as_str(), var.value()))
        .collect();

    for (name, value) in assignments {
        env.insert(name, value);
    }

    env.into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    #[test]
    fn leading_assignments_are_separated() -> Result<()> {
        let mut shell = Shell::new(crate::CreateOptions::default())?;
        let words: Vec<Word> = ["A=1", "B=", "cmd", "C=3"]
            .into_iter()
            .map(Word::from_text)
            .collect();

        let expanded = expand_simple_command(&mut shell, &words)?;
        assert_eq!(
            expanded.assignments,
            vec![("A".to_owned(), "1".to_owned()), ("B".to_owned(), String::new())]
        );
        assert_eq!(expanded.args, vec!["cmd", "C=3"]);
        assert_eq!(expanded.name(), Some("cmd"));
        Ok(())
    }

    #[test]
    fn environment_composition() -> Result<()> {
        let mut shell = Shell::new(crate::CreateOptions::default())?;
        shell.env.set("EXPORTED", "yes", true)?;
        shell.env.set("LOCAL", "no", false)?;

        let env = compose_environment(&shell, &[("EXPORTED".into(), "override".into())]);
        assert!(env.contains(&"EXPORTED=override".to_owned()));
        assert!(!env.iter().any(|entry| entry.starts_with("LOCAL=")));
        assert!(env.iter().any(|entry| entry.starts_with("HUSH_VERSION=")));
        Ok(())
    }

    #[test]
    fn missing_commands() -> Result<()> {
        let mut shell = Shell::new(crate::CreateOptions::default())?;
        shell.env.set("PATH", "/nonexistent", false)?;

        let command = ExpandedCommand {
            assignments: vec![],
            args: vec!["definitely-not-a-command".into()],
        };
        let error = exec_external(&shell, &command);
        assert!(matches!(error, error::Error::CommandNotFound(_)));
        assert_eq!(report_exec_failure("definitely-not-a-command", &error), 127);
        Ok(())
    }
}

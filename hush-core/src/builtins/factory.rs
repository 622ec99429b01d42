use indexmap::IndexMap;
use std::io::Write;

#[allow(clippy::wildcard_imports)]
use super::*;

use crate::builtins;
use crate::commands;
use crate::error;

/// Returns a built-in command registration, given an implementation of the
/// `Command` trait.
pub fn builtin<B: builtins::Command>() -> builtins::Registration {
    builtins::Registration {
        execute_func: exec_builtin::<B>,
        content_func: B::get_content,
    }
}

fn exec_builtin<T: builtins::Command>(
    context: commands::ExecutionContext<'_>,
    args: Vec<String>,
) -> Result<builtins::BuiltinResult, error::Error> {
    let command = match T::new(args) {
        Ok(command) => command,
        Err(e) => {
            let exit_code = if e.use_stderr() {
                write!(context.stderr(), "{e}")?;
                builtins::ExitCode::InvalidUsage
            } else {
                // --help and the like.
                write!(context.stdout(), "{e}")?;
                builtins::ExitCode::Success
            };
            return Ok(builtins::BuiltinResult { exit_code });
        }
    };

    Ok(builtins::BuiltinResult {
        exit_code: command.execute(context)?,
    })
}

/// Returns the shell's builtins, in the order `help` lists them.
pub(crate) fn get_default_builtins() -> IndexMap<&'static str, builtins::Registration> {
    let mut m = IndexMap::<&'static str, builtins::Registration>::new();

    m.insert("bg", builtin::<bg::BgCommand>());
    m.insert("break", builtin::<unimp::BreakCommand>());
    m.insert("cd", builtin::<cd::CdCommand>());
    m.insert("continue", builtin::<unimp::ContinueCommand>());
    m.insert("env", builtin::<env::EnvCommand>());
    m.insert("eval", builtin::<eval::EvalCommand>());
    m.insert("exec", builtin::<exec::ExecCommand>());
    m.insert("exit", builtin::<exit::ExitCommand>());
    m.insert("export", builtin::<export::ExportCommand>());
    m.insert("fg", builtin::<fg::FgCommand>());
    m.insert("jobs", builtin::<jobs::JobsCommand>());
    m.insert("pwd", builtin::<pwd::PwdCommand>());
    m.insert("read", builtin::<read::ReadCommand>());
    m.insert("return", builtin::<unimp::ReturnCommand>());
    m.insert("set", builtin::<set::SetCommand>());
    m.insert("shift", builtin::<shift::ShiftCommand>());
    m.insert("trap", builtin::<unimp::TrapCommand>());
    m.insert("ulimit", builtin::<unimp::ULimitCommand>());
    m.insert("umask", builtin::<umask::UmaskCommand>());
    m.insert("unset", builtin::<unset::UnsetCommand>());
    m.insert(".", builtin::<dot::DotCommand>());
    m.insert("help", builtin::<help::HelpCommand>());

    m
}

use clap::Parser;

use crate::commands::{self, ExpandedCommand};
use crate::{builtins, sys};

/// Exec command, replacing this shell with the exec'd process
#[derive(Parser)]
#[clap(disable_help_flag = true)]
pub(crate) struct ExecCommand {
    /// Command and args.
    #[clap(allow_hyphen_values = true)]
    args: Vec<String>,
}

impl builtins::Command for ExecCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        let Some(name) = self.args.first() else {
            return Ok(builtins::ExitCode::Success);
        };

        sys::signal::restore_default_signals()?;

        let command = ExpandedCommand {
            assignments: vec![],
            args: self.args.clone(),
        };
        let error = commands::exec_external(context.shell, &command);
        let status = commands::report_exec_failure(name, &error);

        if context.shell.is_interactive() {
            sys::signal::ignore_interactive_signals()?;
            Ok(builtins::ExitCode::Custom(status))
        } else {
            Ok(builtins::ExitCode::ExitShell(status))
        }
    }
}

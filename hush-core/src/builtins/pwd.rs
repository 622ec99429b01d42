use clap::Parser;
use std::io::Write;

use crate::{builtins, commands};

/// Print current directory
#[derive(Parser)]
pub(crate) struct PwdCommand {}

impl builtins::Command for PwdCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        let cwd = context.shell.working_dir()?;
        writeln!(context.stdout(), "{}", cwd.display())?;

        Ok(builtins::ExitCode::Success)
    }
}

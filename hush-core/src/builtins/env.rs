use clap::Parser;
use std::io::Write;

use crate::{builtins, commands};

/// Print all environment variables
#[derive(Parser)]
pub(crate) struct EnvCommand {}

impl builtins::Command for EnvCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        print_exported(&context)?;
        Ok(builtins::ExitCode::Success)
    }
}

/// Writes every exported variable as a `NAME=value` line.
pub(super) fn print_exported(
    context: &commands::ExecutionContext<'_>,
) -> Result<(), crate::error::Error> {
    let mut stdout = context.stdout();
    for (name, var) in context.shell.env.iter_exported() {
        writeln!(stdout, "{name}={}", var.value())?;
    }
    Ok(())
}

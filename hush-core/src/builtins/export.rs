use clap::Parser;

use crate::{builtins, commands};

/// Set environment variable
#[derive(Parser)]
pub(crate) struct ExportCommand {
    /// `NAME=VALUE` assignments to export, or names of existing variables.
    #[clap(allow_hyphen_values = true)]
    names: Vec<String>,
}

impl builtins::Command for ExportCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        if self.names.is_empty() {
            super::env::print_exported(&context)?;
            return Ok(builtins::ExitCode::Success);
        }

        for entry in &self.names {
            if let Some((name, value)) = entry.split_once('=') {
                context.shell.env.set(name, value, true)?;
            } else {
                // Exporting an undefined variable isn't an error.
                context.shell.env.export(entry);
            }
        }

        Ok(builtins::ExitCode::Success)
    }
}

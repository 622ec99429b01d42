use clap::Parser;

use crate::{builtins, commands};

/// Unset environment variable
#[derive(Parser)]
pub(crate) struct UnsetCommand {
    /// Names of variables to unset.
    names: Vec<String>,
}

impl builtins::Command for UnsetCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        for name in &self.names {
            context.shell.env.unset(name)?;
        }

        Ok(builtins::ExitCode::Success)
    }
}

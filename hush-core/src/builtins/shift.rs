use clap::Parser;

use crate::{builtins, commands};

/// Shift positional parameters
#[derive(Parser)]
pub(crate) struct ShiftCommand {
    /// Number of positions to shift the arguments by (defaults to 1).
    #[clap(allow_hyphen_values = true)]
    n: Option<i64>,
}

impl builtins::Command for ShiftCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        let n = self.n.unwrap_or(1);

        let Ok(n) = usize::try_from(n) else {
            return Ok(builtins::ExitCode::Custom(1));
        };

        if n > context.shell.positional_parameters.len() {
            return Ok(builtins::ExitCode::Custom(1));
        }

        context.shell.positional_parameters.drain(0..n);

        Ok(builtins::ExitCode::Success)
    }
}

use clap::Parser;
use std::io::Write;

use crate::{builtins, commands};

/// Status used when the argument to `exit` isn't a number.
const INVALID_NUMBER_STATUS: u8 = 255;

/// Exit from shell
#[derive(Parser)]
pub(crate) struct ExitCommand {
    /// The exit code to return; operands after the first are ignored.
    #[clap(allow_hyphen_values = true, trailing_var_arg = true)]
    args: Vec<String>,
}

impl builtins::Command for ExitCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        let Some(code) = self.args.first() else {
            return Ok(builtins::ExitCode::ExitShell(
                context.shell.last_exit_status,
            ));
        };

        match code.parse::<i64>() {
            Ok(value) => {
                let code_8bit = u8::try_from(value & 0xff).unwrap_or(u8::MAX);
                Ok(builtins::ExitCode::ExitShell(code_8bit))
            }
            Err(_) => {
                writeln!(context.stderr(), "hush: exit: invalid number '{code}'")?;
                Ok(builtins::ExitCode::ExitShell(INVALID_NUMBER_STATUS))
            }
        }
    }
}

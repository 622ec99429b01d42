use clap::Parser;
use std::io::Write;

use crate::{builtins, commands};

/// Set/unset shell local variables
#[derive(Parser)]
pub(crate) struct SetCommand {
    /// `NAME=VALUE` assignment to make.
    #[clap(allow_hyphen_values = true)]
    assignment: Option<String>,
}

impl builtins::Command for SetCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        let Some(assignment) = &self.assignment else {
            let mut stdout = context.stdout();
            for (name, var) in context.shell.env.iter() {
                writeln!(stdout, "{name}={}", var.value())?;
            }
            return Ok(builtins::ExitCode::Success);
        };

        if let Some((name, value)) = assignment.split_once('=') {
            context.shell.env.set(name, value, false)?;
        }

        Ok(builtins::ExitCode::Success)
    }
}

use clap::Parser;
use std::io::Write;

use crate::{builtins, commands};

/// Lists the active jobs
#[derive(Parser)]
pub(crate) struct JobsCommand {}

impl builtins::Command for JobsCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        let mut stdout = context.stdout();
        for job in &context.shell.jobs.jobs {
            writeln!(stdout, "{job}")?;
        }

        Ok(builtins::ExitCode::Success)
    }
}

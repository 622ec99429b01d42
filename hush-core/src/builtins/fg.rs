use clap::Parser;
use std::io::Write;

use crate::{builtins, commands};

/// Bring job into the foreground
#[derive(Parser)]
pub(crate) struct FgCommand {
    /// Job spec (`%N`) for the job to move to the foreground; if not specified, the current job is moved.
    job_spec: Option<String>,
}

impl builtins::Command for FgCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        let index = context.shell.resolve_job(self.job_spec.as_deref())?;

        if let Some(job) = context.shell.jobs.jobs.get(index) {
            writeln!(context.stdout(), "{}", job.command_line())?;
        }

        let status = context.shell.foreground_job(index)?;
        Ok(builtins::ExitCode::from(status))
    }
}

use clap::Parser;

use crate::{builtins, commands};

/// Resume a job in the background
#[derive(Parser)]
pub(crate) struct BgCommand {
    /// Job spec (`%N`) of the job to resume; if not specified, the current job is resumed.
    job_spec: Option<String>,
}

impl builtins::Command for BgCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        let index = context.shell.resolve_job(self.job_spec.as_deref())?;
        context.shell.background_job(index)?;

        Ok(builtins::ExitCode::Success)
    }
}

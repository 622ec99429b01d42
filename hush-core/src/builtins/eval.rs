use crate::{builtins, commands};
use clap::Parser;

/// Construct and run shell command
#[derive(Parser)]
pub(crate) struct EvalCommand {
    #[clap(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl builtins::Command for EvalCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        if self.args.is_empty() {
            return Ok(builtins::ExitCode::Success);
        }

        let command = self.args.join(" ");
        tracing::debug!("Applying eval to: {:?}", command);

        let status = context.shell.run_string(&command)?;
        Ok(builtins::ExitCode::from(status))
    }
}

use std::path::PathBuf;

use clap::Parser;

use crate::{builtins, commands};

/// Source-in and run commands in a file
#[derive(Parser)]
pub(crate) struct DotCommand {
    /// Path to the script to run.
    pub script_path: PathBuf,
}

impl builtins::Command for DotCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        let status = context.shell.source_file(&self.script_path)?;
        Ok(builtins::ExitCode::from(status))
    }
}

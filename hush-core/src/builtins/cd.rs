use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use crate::{builtins, commands};

/// Change working directory
#[derive(Parser)]
pub(crate) struct CdCommand {
    /// By default it is the value of the HOME shell variable.
    target_dir: Option<PathBuf>,
}

impl builtins::Command for CdCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        // `cd' without arguments is equivalent to `cd $HOME'
        let target_dir = if let Some(target_dir) = &self.target_dir {
            target_dir.clone()
        } else if let Some(home) = context.shell.env.get_str("HOME") {
            PathBuf::from(home)
        } else {
            writeln!(context.stderr(), "hush: cd: HOME not set")?;
            return Ok(builtins::ExitCode::Custom(1));
        };

        if let Err(e) = context.shell.set_working_dir(&target_dir) {
            writeln!(
                context.stderr(),
                "hush: cd: {}: {e}",
                target_dir.display()
            )?;
            return Ok(builtins::ExitCode::Custom(1));
        }

        Ok(builtins::ExitCode::Success)
    }
}

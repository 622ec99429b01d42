use crate::{builtins, commands};
use clap::Parser;
use std::io::Write;

/// List shell built-in commands
#[derive(Parser)]
pub(crate) struct HelpCommand {
    /// Built-in commands to show detailed help for.
    names: Vec<String>,
}

impl builtins::Command for HelpCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        if self.names.is_empty() {
            list_builtins(&context)?;
            return Ok(builtins::ExitCode::Success);
        }

        let mut result = builtins::ExitCode::Success;
        for name in &self.names {
            if let Some(registration) = context.shell.builtin(name) {
                let content =
                    (registration.content_func)(name, builtins::ContentType::DetailedHelp);
                write!(context.stdout(), "{content}")?;
            } else {
                writeln!(context.stderr(), "hush: help: no help topics match '{name}'")?;
                result = builtins::ExitCode::Custom(1);
            }
        }

        Ok(result)
    }
}

fn list_builtins(context: &commands::ExecutionContext<'_>) -> Result<(), crate::error::Error> {
    let mut stdout = context.stdout();

    writeln!(stdout, "\nBuilt-in commands:")?;
    writeln!(stdout, "-------------------")?;
    for (name, registration) in context.shell.builtins() {
        let description =
            (registration.content_func)(name, builtins::ContentType::ShortDescription);
        writeln!(stdout, "{name}\t{description}")?;
    }
    write!(stdout, "\n\n")?;

    Ok(())
}

use clap::Parser;
use std::io::Read;
use std::os::fd::AsFd;

use crate::{builtins, commands};

/// Input environment variable
#[derive(Parser)]
pub(crate) struct ReadCommand {
    /// Name of the variable to store the line in; the line is discarded if omitted.
    variable_name: Option<String>,
}

impl builtins::Command for ReadCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        let Some(line) = read_line()? else {
            return Ok(builtins::ExitCode::Custom(1));
        };

        if let Some(name) = &self.variable_name {
            context.shell.env.set(name, line, false)?;
        }

        Ok(builtins::ExitCode::Success)
    }
}

/// Reads one line from standard input, without its newline. Bytes are read one
/// at a time so nothing past the newline is consumed. Returns `None` at end
/// of input.
fn read_line() -> Result<Option<String>, crate::error::Error> {
    let mut stdin = std::fs::File::from(std::io::stdin().as_fd().try_clone_to_owned()?);

    let mut line = vec![];
    let mut byte = [0u8; 1];
    loop {
        match stdin.read(&mut byte) {
            Ok(0) if line.is_empty() => return Ok(None),
            Ok(0) => break,
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => line.push(byte[0]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => (),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}

use crate::{builtins, commands, error};
use clap::Parser;
use nix::sys::stat::Mode;
use std::io::Write;

/// Sets file creation mask
#[derive(Parser)]
pub(crate) struct UmaskCommand {
    /// Octal mask to set.
    mode: Option<String>,
}

impl builtins::Command for UmaskCommand {
    fn execute(
        &self,
        context: commands::ExecutionContext<'_>,
    ) -> Result<builtins::ExitCode, crate::error::Error> {
        if let Some(mode) = &self.mode {
            let Ok(new_mask) = parse_umask(mode) else {
                return Ok(builtins::ExitCode::Custom(1));
            };
            nix::sys::stat::umask(new_mask);
        } else {
            let umask = get_umask();
            writeln!(context.stdout(), "{:03o}", umask.bits())?;
        }

        Ok(builtins::ExitCode::Success)
    }
}

fn parse_umask(s: &str) -> Result<Mode, error::Error> {
    let value = u32::from_str_radix(s, 8).map_err(|_| error::Error::InvalidUmask)?;
    let value = nix::libc::mode_t::try_from(value).map_err(|_| error::Error::InvalidUmask)?;
    Ok(Mode::from_bits_truncate(value))
}

fn get_umask() -> Mode {
    // There's no way to read the mask without changing it.
    let current = nix::sys::stat::umask(Mode::empty());
    nix::sys::stat::umask(current);
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    #[test]
    fn umask_parsing() -> Result<()> {
        assert_eq!(parse_umask("022")?.bits(), 0o022);
        assert_eq!(parse_umask("7")?.bits(), 0o007);
        assert!(parse_umask("9").is_err());
        assert!(parse_umask("").is_err());
        assert!(parse_umask("02x").is_err());
        Ok(())
    }
}

//! Command-line arguments for the hush shell.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, builder::styling};

use crate::{events, productinfo};

const SHORT_DESCRIPTION: &str = "Small POSIX-like shell with job control";

const LONG_DESCRIPTION: &str = r"
hush is a small POSIX-like shell: pipelines, redirections, if/for/while/until,
variables, command substitution and job control, in a single small binary.
";

const VERSION: &str = const_format::concatcp!(
    productinfo::PRODUCT_VERSION,
    " (",
    productinfo::PRODUCT_GIT_VERSION,
    ")"
);

/// Parsed command-line arguments for the hush shell.
#[derive(Parser)]
#[clap(name = productinfo::PRODUCT_NAME,
       version = VERSION,
       about = SHORT_DESCRIPTION,
       long_about = LONG_DESCRIPTION,
       disable_help_flag = true,
       disable_version_flag = true,
       styles = hush_help_styles())]
#[allow(clippy::module_name_repetitions)]
pub struct CommandLineArgs {
    /// Display usage information.
    #[clap(long = "help", action = clap::ArgAction::HelpLong)]
    pub help: Option<bool>,

    /// Display shell version.
    #[clap(long = "version", action = clap::ArgAction::Version)]
    pub version: Option<bool>,

    /// Execute the provided command and then exit.
    #[arg(short = 'c', value_name = "COMMAND")]
    pub command: Option<String>,

    /// Run in interactive mode.
    #[clap(short = 'i')]
    pub interactive: bool,

    /// Parse commands without executing them.
    #[clap(short = 'f')]
    pub do_not_execute_commands: bool,

    /// Print commands as they execute (accepted for compatibility; no effect).
    #[clap(short = 'x')]
    pub print_commands_and_arguments: bool,

    /// Make shell act as if it had been invoked as a login shell.
    #[clap(short = 'l', long = "login")]
    pub login: bool,

    /// Path to the configuration file to load.
    #[clap(long = "config", value_name = "PATH", conflicts_with = "no_config")]
    pub config_path: Option<PathBuf>,

    /// Don't load any configuration file.
    #[clap(long = "no-config", alias = "norc")]
    pub no_config: bool,

    /// Enable debug logging for classes of tracing events.
    #[clap(long = "debug", value_name = "EVENT")]
    pub enabled_debug_events: Vec<events::TraceEvent>,

    /// Path to script to execute.
    // allow any string as command_name similar to sh
    #[clap(allow_hyphen_values = true)]
    pub script_path: Option<String>,

    /// Arguments for script.
    #[clap(allow_hyphen_values = true, num_args = 1..)]
    pub script_args: Vec<String>,
}

impl CommandLineArgs {
    /// Returns whether the shell should run interactively: either because it
    /// was asked to, or because it has no script to run and is talking to a
    /// terminal.
    pub fn is_interactive(&self) -> bool {
        if self.interactive {
            return true;
        }

        if self.command.is_some() || self.script_path.is_some() {
            return false;
        }

        std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
    }
}

/// Returns clap styling to be used for command-line help.
#[doc(hidden)]
fn hush_help_styles() -> clap::builder::Styles {
    styling::Styles::styled()
        .header(
            styling::AnsiColor::Yellow.on_default()
                | styling::Effects::BOLD
                | styling::Effects::UNDERLINE,
        )
        .usage(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .literal(styling::AnsiColor::Magenta.on_default() | styling::Effects::BOLD)
        .placeholder(styling::AnsiColor::Cyan.on_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    #[test]
    fn command_string_with_arguments() -> Result<()> {
        let args = CommandLineArgs::try_parse_from(["hush", "-c", "echo $1", "name", "one"])?;
        assert_eq!(args.command.as_deref(), Some("echo $1"));
        assert_eq!(args.script_path.as_deref(), Some("name"));
        assert_eq!(args.script_args, vec!["one".to_owned()]);
        assert!(!args.is_interactive());
        Ok(())
    }

    #[test]
    fn script_arguments_keep_hyphens() -> Result<()> {
        let args = CommandLineArgs::try_parse_from(["hush", "script.sh", "-x", "--flag"])?;
        assert_eq!(args.script_path.as_deref(), Some("script.sh"));
        assert_eq!(args.script_args, vec!["-x".to_owned(), "--flag".to_owned()]);
        assert!(!args.print_commands_and_arguments);
        Ok(())
    }

    #[test]
    fn flags() -> Result<()> {
        let args = CommandLineArgs::try_parse_from([
            "hush", "-i", "-f", "-x", "--no-config", "--debug", "jobs", "--debug", "parse",
        ])?;
        assert!(args.interactive);
        assert!(args.is_interactive());
        assert!(args.do_not_execute_commands);
        assert!(args.print_commands_and_arguments);
        assert!(args.no_config);
        assert_eq!(
            args.enabled_debug_events,
            vec![events::TraceEvent::Jobs, events::TraceEvent::Parse]
        );
        Ok(())
    }

    #[test]
    fn config_flags_conflict() {
        assert!(
            CommandLineArgs::try_parse_from(["hush", "--config", "a.toml", "--no-config"]).is_err()
        );
    }
}

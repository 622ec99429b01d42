//! Implements the command-line interface for the `hush` shell.

use std::path::Path;

use clap::Parser;

use crate::args::CommandLineArgs;
use crate::config::{self, Config};
use crate::events;
use crate::productinfo;

/// Line printed under the product string when an interactive session starts.
const BANNER: &str = "Enter 'help' for a list of built-in commands.";

/// Main entry point for the `hush` shell. Never returns; the process exits
/// with the status of the last command the shell ran.
pub fn run() -> ! {
    install_panic_handler();

    let cli_args: Vec<_> = std::env::args().collect();
    let parsed_args = CommandLineArgs::parse_from(&cli_args);

    let _event_config = events::TraceEventConfig::init(&parsed_args.enabled_debug_events);

    let exit_code = match load_config(&parsed_args) {
        Some(config) => run_with_config(&cli_args, &parsed_args, &config),
        None => 1,
    };

    std::process::exit(i32::from(exit_code));
}

/// Sets up panic handling. On release builds, it will capture panic details to a
/// temporary .toml file and report a human-readable message to the screen.
fn install_panic_handler() {
    human_panic::setup_panic!(
        human_panic::Metadata::new(productinfo::PRODUCT_NAME, productinfo::PRODUCT_VERSION)
            .homepage(env!("CARGO_PKG_REPOSITORY"))
            .support(concat!("please file an issue at ", env!("CARGO_PKG_REPOSITORY")))
    );
}

/// Loads the configuration file, returning `None` if a file named on the
/// command line couldn't be loaded.
fn load_config(args: &CommandLineArgs) -> Option<Config> {
    let result = config::load_config(args.no_config, args.config_path.as_deref());

    if let Some(error) = &result.error {
        let path = result
            .path
            .as_deref()
            .map_or_else(String::new, |p| p.display().to_string());

        if result.explicit_path {
            eprintln!("hush: {path}: {error}");
            return None;
        }

        tracing::warn!("{path}: {error}; using default configuration");
    }

    Some(result.config)
}

/// Creates the shell and runs whatever the arguments ask for. The shell is
/// dropped, releasing the terminal, before this returns.
fn run_with_config(cli_args: &[String], args: &CommandLineArgs, config: &Config) -> u8 {
    let mut shell = match instantiate_shell(cli_args, args, config) {
        Ok(shell) => shell,
        Err(e) => {
            eprintln!("hush: {e}");
            return 1;
        }
    };

    if let Err(e) = run_in_shell(&mut shell, args, config) {
        eprintln!("hush: {e}");
        return 1;
    }

    shell.last_exit_status
}

fn instantiate_shell(
    cli_args: &[String],
    args: &CommandLineArgs,
    config: &Config,
) -> Result<hush_core::Shell, hush_core::Error> {
    let argv0 = cli_args.first().cloned();
    let login = args.login || argv0.as_deref().is_some_and(|a0| a0.starts_with('-'));

    // With -c, the first operand names the shell ($0) and the rest become the
    // positional parameters.
    let shell_name = if args.command.is_some() || args.script_path.is_some() {
        args.script_path.clone().or(argv0)
    } else {
        argv0
    };

    if args.print_commands_and_arguments {
        tracing::debug!("-x has no effect");
    }

    hush_core::Shell::new(hush_core::CreateOptions {
        interactive: args.is_interactive(),
        do_not_execute_commands: args.do_not_execute_commands,
        login,
        profile_path: Some(config.login_profile()),
        shell_name,
        positional_parameters: args.script_args.clone(),
        ..hush_core::CreateOptions::default()
    })
}

fn run_in_shell(
    shell: &mut hush_core::Shell,
    args: &CommandLineArgs,
    config: &Config,
) -> Result<u8, hush_core::Error> {
    if let Some(command) = &args.command {
        shell.run_string(command)
    } else if let Some(script_path) = &args.script_path {
        shell.run_script(Path::new(script_path))
    } else if shell.is_interactive() {
        if config.show_banner() {
            println!("\n\n{}\n{BANNER}\n", productinfo::PRODUCT_DISPLAY_STR);
        }
        shell.run_interactive(hush_core::InteractivePrompt::new(config.ui.prompt.clone()))
    } else {
        shell.run_stdin()
    }
}

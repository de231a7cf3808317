//! `eventreg` operator CLI.
//!
//! # Responsibility
//! - Resolve configuration, start logging, and dispatch one command.
//! - Report failures on stderr with a kind-specific exit status.

mod commands;
mod config;

use clap::Parser;
use commands::CliError;
use config::{Cli, Config};

fn main() {
    let cli = Cli::parse();

    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(message) => {
            let err = CliError::Config(message);
            eprintln!("Error: {err}");
            std::process::exit(err.exit_code());
        }
    };

    if let Some(log_dir) = config.log_dir.as_ref() {
        if let Err(message) =
            eventreg_core::init_logging(&config.log_level, &log_dir.to_string_lossy())
        {
            eprintln!("Warning: logging disabled: {message}");
        }
    }

    if let Err(err) = commands::run(&config, cli.command) {
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }
}

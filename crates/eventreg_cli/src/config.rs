//! Command-line surface and runtime configuration.
//!
//! # Responsibility
//! - Declare arguments, with environment fallbacks, for every command.
//! - Resolve them into the explicit values the core expects.

use clap::{Args, Parser, Subcommand, ValueEnum};
use eventreg_core::{default_log_level, EventStatus, DEFAULT_COUNTRY_CODE};
use std::path::PathBuf;
use uuid::Uuid;

const DEFAULT_DB_FILE_NAME: &str = "eventreg.sqlite3";

#[derive(Parser)]
#[command(name = "eventreg")]
#[command(about = "Publish capacity-bounded events and register participants by phone")]
#[command(version)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, env = "EVENTREG_DB_PATH", default_value = DEFAULT_DB_FILE_NAME)]
    pub db: PathBuf,

    /// Log level (trace|debug|info|warn|error); defaults by build mode
    #[arg(long, env = "EVENTREG_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Directory for rolling log files; logging is off when unset
    #[arg(long, env = "EVENTREG_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Country code used to validate and normalize phones
    #[arg(long, env = "EVENTREG_COUNTRY_CODE", default_value = DEFAULT_COUNTRY_CODE)]
    pub country_code: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage events
    #[command(subcommand)]
    Event(EventCommand),

    /// Register a participant for an event
    Register {
        event_id: Uuid,
        #[arg(long)]
        name: String,
        /// Canonical (+5511...) or typed ((11) 91234-5678) phone
        #[arg(long)]
        phone: String,
    },

    /// List an event's registrations, sorted by name
    Registrations { event_id: Uuid },

    /// Show capacity, registration count and remaining seats
    Count { event_id: Uuid },

    /// Cancel the registration of one phone
    Cancel {
        event_id: Uuid,
        #[arg(long)]
        phone: String,
    },

    /// Insert demo events
    Seed,
}

#[derive(Subcommand)]
pub enum EventCommand {
    /// Create an event
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        capacity: i64,
        #[arg(long, value_enum, default_value_t = StatusArg::Open)]
        status: StatusArg,
    },

    /// Show one event
    Get { event_id: Uuid },

    /// List events
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Update selected fields of an event
    Update {
        event_id: Uuid,
        #[command(flatten)]
        fields: UpdateFields,
    },

    /// Delete an event and all its registrations
    Delete { event_id: Uuid },
}

#[derive(Args)]
pub struct UpdateFields {
    #[arg(long)]
    pub title: Option<String>,
    /// Empty string clears the description
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    pub capacity: Option<i64>,
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Open,
    Closed,
}

impl From<StatusArg> for EventStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Open => EventStatus::Open,
            StatusArg::Closed => EventStatus::Closed,
        }
    }
}

/// Settings resolved from CLI arguments and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub country_code: String,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, String> {
        let log_dir = match cli.log_dir.as_ref() {
            Some(dir) if dir.is_absolute() => Some(dir.clone()),
            Some(dir) => {
                let cwd = std::env::current_dir()
                    .map_err(|err| format!("cannot resolve log directory: {err}"))?;
                Some(cwd.join(dir))
            }
            None => None,
        };

        Ok(Self {
            db_path: cli.db.clone(),
            log_level: cli
                .log_level
                .clone()
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir,
            country_code: cli.country_code.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, Config, EventCommand};
    use clap::Parser;

    #[test]
    fn relative_log_dir_is_made_absolute() {
        let cli = Cli::parse_from(["eventreg", "--log-dir", "logs", "seed"]);
        let config = Config::from_cli(&cli).unwrap();
        assert!(config.log_dir.unwrap().is_absolute());
    }

    #[test]
    fn create_accepts_negative_capacity_for_core_validation() {
        let cli = Cli::parse_from([
            "eventreg", "event", "create", "--title", "Talk", "--capacity", "-1",
        ]);
        match cli.command {
            Command::Event(EventCommand::Create { capacity, .. }) => assert_eq!(capacity, -1),
            _ => panic!("expected event create"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

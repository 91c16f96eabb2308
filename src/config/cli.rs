use crate::config::toml_config::TomlConfig;
use crate::domain::model::BookingStatus;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "booking-lifecycle")]
#[command(about = "Inspect and change booking statuses in a SQLite store")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides storage.database_path)
    #[arg(long)]
    pub database: Option<String>,

    /// Attempts per status change before reporting a conflict
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create the bookings table if it does not exist
    Init,
    /// Insert a new pending booking
    Create {
        #[arg(long)]
        customer: i64,
        #[arg(long)]
        worker: i64,
        #[arg(long)]
        service: i64,
    },
    /// Print a booking as JSON
    Show { id: i64 },
    /// Move a booking to a new status
    Status { id: i64, status: BookingStatus },
    /// List the statuses reachable from STATUS (or the whole graph)
    Transitions { status: Option<BookingStatus> },
}

impl CliConfig {
    /// Loads the config file (or defaults) and applies command line overrides.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(database) = &self.database {
            config.storage.database_path = database.clone();
        }
        if let Some(max_attempts) = self.max_attempts {
            config.lifecycle.max_attempts = max_attempts;
        }
        if self.json_logs {
            config.logging.format = "json".to_string();
        }
        if self.verbose {
            config.logging.verbose = true;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigProvider;

    #[test]
    fn test_parse_status_command() {
        let cli = CliConfig::try_parse_from([
            "booking-lifecycle",
            "--database",
            "test.db",
            "status",
            "7",
            "in-progress",
        ])
        .unwrap();

        match cli.command {
            Command::Status { id, status } => {
                assert_eq!(id, 7);
                assert_eq!(status, BookingStatus::InProgress);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result = CliConfig::try_parse_from(["booking-lifecycle", "status", "7", "archived"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = CliConfig::try_parse_from([
            "booking-lifecycle",
            "--database",
            "override.db",
            "--max-attempts",
            "5",
            "--json-logs",
            "init",
        ])
        .unwrap();

        let config = cli.resolve().unwrap();
        assert_eq!(config.database_path(), "override.db");
        assert_eq!(config.max_attempts(), 5);
        assert!(config.json_logs());
    }
}

//! Command-line interface for botctl.
use std::{env, str::FromStr};

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::constants::LOG_LEVEL_VAR;

/// Wrapper around `LevelFilter` so log levels can be given either as names
/// ("info", "debug", etc.) or numeric shorthands (0-5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevelArg(LevelFilter);

impl LogLevelArg {
    /// String representation suitable for `RUST_LOG`.
    pub fn as_str(&self) -> &'static str {
        match self.0 {
            LevelFilter::OFF => "off",
            LevelFilter::ERROR => "error",
            LevelFilter::WARN => "warn",
            LevelFilter::INFO => "info",
            LevelFilter::DEBUG => "debug",
            LevelFilter::TRACE => "trace",
        }
    }

    /// Reads `BOTCTL_LOG_LEVEL`, ignoring values that do not parse.
    pub fn from_env() -> Option<Self> {
        env::var(LOG_LEVEL_VAR)
            .ok()
            .and_then(|value| value.parse().ok())
    }
}

impl FromStr for LogLevelArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("log level cannot be empty".into());
        }

        if let Ok(number) = trimmed.parse::<u8>() {
            let level = match number {
                0 => LevelFilter::OFF,
                1 => LevelFilter::ERROR,
                2 => LevelFilter::WARN,
                3 => LevelFilter::INFO,
                4 => LevelFilter::DEBUG,
                5 => LevelFilter::TRACE,
                _ => {
                    return Err(format!(
                        "unsupported log level number '{number}' (expected 0-5)"
                    ));
                }
            };

            return Ok(LogLevelArg(level));
        }

        let lowercase = trimmed.to_ascii_lowercase();
        let level = match lowercase.as_str() {
            "off" => Some(LevelFilter::OFF),
            "error" | "err" => Some(LevelFilter::ERROR),
            "warn" | "warning" => Some(LevelFilter::WARN),
            "info" | "information" => Some(LevelFilter::INFO),
            "debug" => Some(LevelFilter::DEBUG),
            "trace" => Some(LevelFilter::TRACE),
            _ => None,
        }
        .ok_or_else(|| format!("invalid log level '{trimmed}'"))?;

        Ok(LogLevelArg(level))
    }
}

/// Command-line interface for botctl.
#[derive(Parser, Debug)]
#[command(name = "botctl", version)]
#[command(
    about = "Installs and manages the DTEK monitoring bot as a systemd service",
    long_about = None
)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for botctl.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Store the bot token, write the unit, then enable and start the service.
    Install,
    /// Restart the service and show its status.
    Restart,
    /// Stop the service (it stays enabled at boot).
    Stop,
    /// Show installed files and the service status.
    Status,
    /// Follow the service log until interrupted.
    Logs,
    /// Disable the service and remove its unit and token files.
    Uninstall,
}

impl Commands {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Install => "install",
            Commands::Restart => "restart",
            Commands::Stop => "stop",
            Commands::Status => "status",
            Commands::Logs => "logs",
            Commands::Uninstall => "uninstall",
        }
    }

    /// Whether the subcommand changes system state and needs root.
    pub fn requires_root(&self) -> bool {
        !matches!(self, Commands::Status | Commands::Logs)
    }
}

/// Parses command-line arguments and returns a `Cli` struct.
pub fn parse_args() -> Cli {
    Cli::parse()
}

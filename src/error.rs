//! Error handling for botctl.
use std::path::PathBuf;

use thiserror::Error;

use crate::constants::{
    EXIT_CONFIG, EXIT_FAILURE, EXIT_NOINPUT, EXIT_NOPERM, EXIT_UNAVAILABLE,
};

/// Defines all possible errors raised while managing the service.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// An ambient value required to resolve paths or identity is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A privileged subcommand was invoked without root.
    #[error("'{command}' requires root privileges; re-run with: {hint}")]
    Privilege {
        /// The subcommand that was refused.
        command: String,
        /// The exact command line to run instead.
        hint: String,
    },

    /// A runtime artifact the service needs is missing.
    #[error("Missing {what} at {}; {hint}", path.display())]
    Preflight {
        /// Human name of the artifact.
        what: &'static str,
        /// Where it was expected.
        path: PathBuf,
        /// Remediation command.
        hint: String,
    },

    /// The unit template could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// An init system command ran and reported failure.
    #[error("Command `{command}` failed with {}", describe_code(*code))]
    ExternalCommand {
        /// The command line that failed.
        command: String,
        /// Exit code, when the process exited normally.
        code: Option<i32>,
    },

    /// An init system command could not be launched at all.
    #[error("Failed to run `{command}`: {source}")]
    CommandSpawn {
        /// The command line that could not be spawned.
        command: String,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing one of the managed files failed.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// The install lock could not be acquired.
    #[error("Failed to lock {}: {source}", path.display())]
    Lock {
        /// The lock file.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// The token could not be read from the terminal.
    #[error("Failed to read token from terminal: {0}")]
    Prompt(#[source] std::io::Error),
}

impl ManagerError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ManagerError::Configuration(_) => EXIT_CONFIG,
            ManagerError::Privilege { .. } => EXIT_NOPERM,
            ManagerError::Preflight { .. } => EXIT_UNAVAILABLE,
            ManagerError::Template(_) => EXIT_NOINPUT,
            ManagerError::ExternalCommand { code, .. } => code
                .and_then(|code| u8::try_from(code).ok())
                .filter(|code| *code != 0)
                .unwrap_or(EXIT_FAILURE),
            ManagerError::CommandSpawn { .. }
            | ManagerError::Io { .. }
            | ManagerError::Lock { .. }
            | ManagerError::Prompt(_) => EXIT_FAILURE,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManagerError::Io {
            path: path.into(),
            source,
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "termination by signal".to_string(),
    }
}

/// Error type for unit template rendering.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template file could not be read.
    #[error("Failed to read unit template {}: {source}", path.display())]
    Unreadable {
        /// Template location.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// The template references a placeholder botctl cannot fill.
    #[error("Unit template uses unknown placeholder {{{{{name}}}}}")]
    UnknownPlaceholder {
        /// Placeholder name without braces.
        name: String,
    },
}

//! Root privilege checks for subcommands that touch system state.
use std::{env, path::PathBuf};

use nix::unistd::Uid;
use tracing::debug;

use crate::constants::ELEVATION_PREFIX;
use crate::error::ManagerError;

/// Fails unless the process runs with an effective uid of 0.
///
/// The error carries the exact command line to re-run with elevation so the
/// caller can print it verbatim before exiting.
pub fn require_elevated(subcommand: &str) -> Result<(), ManagerError> {
    check_elevated(Uid::effective(), &invocation_program(), subcommand)
}

pub(crate) fn check_elevated(
    euid: Uid,
    program: &str,
    subcommand: &str,
) -> Result<(), ManagerError> {
    if euid.is_root() {
        debug!("running with root privileges for '{subcommand}'");
        return Ok(());
    }

    Err(ManagerError::Privilege {
        command: subcommand.to_string(),
        hint: elevation_hint(program, subcommand),
    })
}

/// Builds `sudo <program> <subcommand>`.
pub fn elevation_hint(program: &str, subcommand: &str) -> String {
    format!("{ELEVATION_PREFIX} {program} {subcommand}")
}

/// The program path to show in hints, preferring the resolved executable.
fn invocation_program() -> String {
    env::current_exe()
        .ok()
        .or_else(|| env::args_os().next().map(PathBuf::from))
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

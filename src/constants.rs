//! Constants and default locations used by botctl.
//!
//! Every path here can be redirected through an environment override resolved
//! in [`crate::config`]; the values below are what a stock host uses.

// ============================================================================
// Service Identity
// ============================================================================

/// Name of the systemd service managed by this tool.
pub const SERVICE_NAME: &str = "dtek-bot";

/// Suffix systemd expects on service unit files.
pub const UNIT_SUFFIX: &str = ".service";

// ============================================================================
// File System Layout
// ============================================================================

/// Directory holding administrator-installed systemd units.
pub const DEFAULT_UNIT_DIR: &str = "/etc/systemd/system";

/// Directory holding the secret environment file.
pub const DEFAULT_ENV_DIR: &str = "/etc";

/// Extension of the secret environment file.
pub const ENV_FILE_SUFFIX: &str = ".env";

/// Directory holding the install/uninstall lock file.
pub const DEFAULT_LOCK_DIR: &str = "/run/lock";

/// Extension of the install/uninstall lock file.
pub const LOCK_FILE_SUFFIX: &str = ".lock";

/// Unit template, relative to the repository root.
pub const TEMPLATE_RELATIVE_PATH: &str = "deploy/dtek-bot.service.tpl";

/// Virtualenv interpreter, relative to the repository root.
pub const INTERPRETER_RELATIVE_PATH: &str = ".venv/bin/python";

/// Bot entrypoint, relative to the repository root.
pub const ENTRYPOINT_RELATIVE_PATH: &str = "bot.py";

/// Permission bits of the rendered unit file.
pub const UNIT_FILE_MODE: u32 = 0o644;

/// Permission bits of the secret environment file.
pub const SECRET_FILE_MODE: u32 = 0o600;

// ============================================================================
// Environment Variables
// ============================================================================

/// Variable holding the bot credential, both at install time and in the env file.
pub const TOKEN_VAR: &str = "BOT_TOKEN";

/// Overrides the account the installed service runs as.
pub const SERVICE_USER_VAR: &str = "BOTCTL_SERVICE_USER";

/// Set by sudo to the account that requested elevation.
pub const SUDO_USER_VAR: &str = "SUDO_USER";

/// Overrides the repository root derived from the executable location.
pub const REPO_ROOT_VAR: &str = "BOTCTL_REPO_ROOT";

/// Overrides the interpreter path.
pub const PYTHON_VAR: &str = "BOTCTL_PYTHON";

/// Overrides [`DEFAULT_UNIT_DIR`].
pub const UNIT_DIR_VAR: &str = "BOTCTL_UNIT_DIR";

/// Overrides [`DEFAULT_ENV_DIR`].
pub const ENV_DIR_VAR: &str = "BOTCTL_ENV_DIR";

/// Overrides [`DEFAULT_LOCK_DIR`].
pub const LOCK_DIR_VAR: &str = "BOTCTL_LOCK_DIR";

/// Log verbosity for a single invocation (`info`, `debug`, or `0`-`5`).
pub const LOG_LEVEL_VAR: &str = "BOTCTL_LOG_LEVEL";

// ============================================================================
// Host Commands
// ============================================================================

/// Command used to re-run a subcommand with elevated privileges.
pub const ELEVATION_PREFIX: &str = "sudo";

/// systemd control binary.
pub const SYSTEMCTL: &str = "systemctl";

/// systemd journal reader.
pub const JOURNALCTL: &str = "journalctl";

/// Lines of backlog shown before following the journal.
pub const LOG_BACKLOG_LINES: usize = 50;

// ============================================================================
// Exit Codes
// ============================================================================

/// Generic failure (I/O, locking, external command without an exit code).
pub const EXIT_FAILURE: u8 = 1;

/// Required input (the unit template) could not be read or is malformed.
pub const EXIT_NOINPUT: u8 = 66;

/// A runtime prerequisite is missing.
pub const EXIT_UNAVAILABLE: u8 = 69;

/// The invocation lacks root privileges.
pub const EXIT_NOPERM: u8 = 77;

/// Ambient configuration could not be resolved.
pub const EXIT_CONFIG: u8 = 78;

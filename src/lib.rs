//! botctl installs the DTEK outage-monitoring bot as a systemd service and
//! manages its lifecycle: it stores the bot token in a root-only env file,
//! renders the unit from a template, and drives `systemctl`/`journalctl` to
//! install, restart, stop, inspect, follow and remove the service.

/// CLI interface.
pub mod cli;

/// Path and identity resolution.
pub mod config;

/// Default locations, variable names and exit codes.
pub mod constants;

/// Lifecycle operations.
pub mod controller;

/// Error handling.
pub mod error;

/// Atomic file replacement and the install lock.
pub mod files;

/// Root privilege checks.
pub mod privilege;

/// Bot token acquisition and storage.
pub mod secret;

/// Process supervisor capability interface.
pub mod supervisor;

/// systemd adapter.
pub mod systemd;

/// Unit template rendering.
pub mod template;

/// Shared helpers for unit and integration tests.
///
/// Public only so `tests/integration` can drive the controller against
/// [`test_utils::RecordingSupervisor`]; not part of the supported API.
#[doc(hidden)]
pub mod test_utils;

//! Capability interface over the host process supervisor.
//!
//! The controller only talks to this trait. [`crate::systemd::Systemd`] is the
//! production adapter; tests use [`crate::test_utils::RecordingSupervisor`].
use crate::error::ManagerError;

/// Operations botctl needs from an init system.
///
/// `unit` is the full unit name (`dtek-bot.service`). Every method is a single
/// synchronous attempt; failures are returned, never retried.
pub trait Supervisor {
    /// Rereads unit files from disk.
    fn reload(&self) -> Result<(), ManagerError>;

    /// Enables `unit` at boot and starts it in one step.
    fn register(&self, unit: &str) -> Result<(), ManagerError>;

    /// Restarts `unit`, starting it if it was stopped.
    fn restart(&self, unit: &str) -> Result<(), ManagerError>;

    /// Stops `unit` without touching its boot enablement.
    fn stop(&self, unit: &str) -> Result<(), ManagerError>;

    /// Whether `unit` is currently running.
    fn is_active(&self, unit: &str) -> Result<bool, ManagerError>;

    /// Prints a human-readable status report for `unit`.
    fn query_status(&self, unit: &str) -> Result<(), ManagerError>;

    /// Follows the log stream of `unit` until interrupted.
    fn stream_logs(&self, unit: &str) -> Result<(), ManagerError>;

    /// Disables and stops `unit`.
    fn deregister(&self, unit: &str) -> Result<(), ManagerError>;
}

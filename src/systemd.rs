//! [`Supervisor`] adapter that shells out to `systemctl` and `journalctl`.
use std::{
    ffi::OsStr,
    process::{Command, ExitStatus, Stdio},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::{debug, info};

use crate::constants::{JOURNALCTL, LOG_BACKLOG_LINES, SYSTEMCTL};
use crate::error::ManagerError;
use crate::supervisor::Supervisor;

/// Drives systemd through its command-line tools.
#[derive(Debug, Clone)]
pub struct Systemd {
    systemctl: String,
    journalctl: String,
}

impl Default for Systemd {
    fn default() -> Self {
        Self::new(SYSTEMCTL, JOURNALCTL)
    }
}

impl Systemd {
    /// Uses the given binaries instead of the ones on `PATH`.
    pub fn new(systemctl: impl Into<String>, journalctl: impl Into<String>) -> Self {
        Self {
            systemctl: systemctl.into(),
            journalctl: journalctl.into(),
        }
    }

    fn systemctl<I, S>(&self, args: I) -> Result<(), ManagerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.systemctl);
        cmd.args(args);
        run(cmd)
    }
}

fn describe(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn status_of(cmd: &mut Command) -> Result<ExitStatus, ManagerError> {
    let command = describe(cmd);
    debug!("Executing command: {command}");
    cmd.status()
        .map_err(|source| ManagerError::CommandSpawn { command, source })
}

fn run(mut cmd: Command) -> Result<(), ManagerError> {
    let status = status_of(&mut cmd)?;
    if status.success() {
        Ok(())
    } else {
        Err(ManagerError::ExternalCommand {
            command: describe(&cmd),
            code: status.code(),
        })
    }
}

impl Supervisor for Systemd {
    fn reload(&self) -> Result<(), ManagerError> {
        info!("reloading systemd unit files");
        self.systemctl(["daemon-reload"])
    }

    fn register(&self, unit: &str) -> Result<(), ManagerError> {
        info!("enabling and starting {unit}");
        self.systemctl(["enable", "--now", unit])
    }

    fn restart(&self, unit: &str) -> Result<(), ManagerError> {
        info!("restarting {unit}");
        self.systemctl(["restart", unit])
    }

    fn stop(&self, unit: &str) -> Result<(), ManagerError> {
        info!("stopping {unit}");
        self.systemctl(["stop", unit])
    }

    fn is_active(&self, unit: &str) -> Result<bool, ManagerError> {
        let mut cmd = Command::new(&self.systemctl);
        cmd.args(["is-active", "--quiet", unit]);
        Ok(status_of(&mut cmd)?.success())
    }

    fn query_status(&self, unit: &str) -> Result<(), ManagerError> {
        self.systemctl(["status", "--no-pager", unit])
    }

    fn stream_logs(&self, unit: &str) -> Result<(), ManagerError> {
        // The journal reader shares our process group, so Ctrl-C reaches it
        // directly. Any other termination by signal is a failure.
        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupted);
        if let Err(err) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
            debug!("could not install interrupt handler: {err}");
        }

        let lines = LOG_BACKLOG_LINES.to_string();
        let mut cmd = Command::new(&self.journalctl);
        cmd.args(["--unit", unit, "--follow", "--no-pager", "--lines", lines.as_str()])
            .stdin(Stdio::null());

        let status = status_of(&mut cmd)?;
        if status.success() || interrupted.load(Ordering::SeqCst) {
            info!("log stream for {unit} ended");
            return Ok(());
        }

        Err(ManagerError::ExternalCommand {
            command: describe(&cmd),
            code: status.code(),
        })
    }

    fn deregister(&self, unit: &str) -> Result<(), ManagerError> {
        info!("disabling and stopping {unit}");
        self.systemctl(["disable", "--now", unit])
    }
}

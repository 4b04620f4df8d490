//! Lifecycle operations for the bot service.
//!
//! [`ServiceController`] is the only code that mutates the init system's
//! registration of the service. Each public method corresponds to one
//! subcommand and performs a single attempt; nothing is retried.
use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::config::Config;
use crate::constants::UNIT_FILE_MODE;
use crate::error::ManagerError;
use crate::files::{InstallLock, remove_if_present, write_atomic};
use crate::secret::{SecretMaterial, persist_secret};
use crate::supervisor::Supervisor;
use crate::template::{self, UnitValues};

/// Artifacts removed by [`ServiceController::uninstall`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UninstallReport {
    /// Files that existed and were deleted.
    pub removed: Vec<PathBuf>,
}

impl UninstallReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Presence of the files botctl manages, as shown by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactStatus {
    pub unit_file: bool,
    pub env_file: bool,
}

/// Runs lifecycle operations for one service against a [`Supervisor`].
pub struct ServiceController<S: Supervisor> {
    config: Config,
    supervisor: S,
}

impl<S: Supervisor> ServiceController<S> {
    pub fn new(config: Config, supervisor: S) -> Self {
        Self { config, supervisor }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn supervisor(&self) -> &S {
        &self.supervisor
    }

    fn unit(&self) -> String {
        self.config.identity.unit_name()
    }

    /// Checks the interpreter and entrypoint the unit will launch.
    ///
    /// Runs before anything is written or the supervisor is contacted.
    pub fn preflight(&self) -> Result<(), ManagerError> {
        let runtime = &self.config.runtime;
        let repo = runtime.repo_root.display();

        if !is_executable(&runtime.interpreter_path) {
            return Err(ManagerError::Preflight {
                what: "Python interpreter",
                path: runtime.interpreter_path.clone(),
                hint: format!(
                    "create the virtualenv with: python3 -m venv {repo}/.venv && \
                     {repo}/.venv/bin/pip install -r {repo}/requirements.txt"
                ),
            });
        }

        if !runtime.entrypoint_path.is_file() {
            return Err(ManagerError::Preflight {
                what: "bot entrypoint",
                path: runtime.entrypoint_path.clone(),
                hint: format!("check out the bot sources into {repo}"),
            });
        }

        Ok(())
    }

    /// Installs (or reinstalls) the service and leaves it enabled and running.
    ///
    /// `acquire` is only called once preflight has passed, so a missing
    /// interpreter never costs the operator a token prompt. The template is
    /// rendered before anything is written, so a broken template leaves the
    /// previous installation untouched. Reinstalling replaces the env file
    /// and unit file and restarts a running service.
    pub fn install<F>(&self, acquire: F) -> Result<(), ManagerError>
    where
        F: FnOnce() -> Result<SecretMaterial, ManagerError>,
    {
        let identity = &self.config.identity;
        let _lock = InstallLock::acquire(&self.config.lock_path)?;

        self.preflight()?;

        let secret = acquire()?;
        let descriptor =
            template::render(&identity.template_path, &UnitValues::from_config(&self.config))?;

        persist_secret(&secret, &identity.env_file_path, self.config.secret_owner)?;
        write_atomic(
            &identity.unit_path,
            descriptor.as_str().as_bytes(),
            UNIT_FILE_MODE,
            None,
        )?;
        info!("wrote unit file {}", identity.unit_path.display());

        let unit = self.unit();
        let was_active = self.supervisor.is_active(&unit).unwrap_or_else(|err| {
            warn!("could not determine whether {unit} is running: {err}");
            false
        });

        self.supervisor.reload()?;
        self.supervisor.register(&unit)?;
        if was_active {
            self.supervisor.restart(&unit)?;
        }

        println!(
            "Installed {unit} (user {}, unit {}, env {})",
            self.config.runtime.invoking_user,
            identity.unit_path.display(),
            identity.env_file_path.display()
        );
        Ok(())
    }

    /// Restarts the service, then shows its status on a best-effort basis.
    pub fn restart(&self) -> Result<(), ManagerError> {
        let unit = self.unit();
        self.supervisor.restart(&unit)?;
        if let Err(err) = self.supervisor.query_status(&unit) {
            warn!("status of {unit} unavailable after restart: {err}");
        }
        Ok(())
    }

    /// Stops the service. It stays enabled for the next boot.
    pub fn stop(&self) -> Result<(), ManagerError> {
        let unit = self.unit();
        self.supervisor.stop(&unit)?;
        println!("Stopped {unit}");
        Ok(())
    }

    /// Which managed files currently exist.
    pub fn artifacts(&self) -> ArtifactStatus {
        ArtifactStatus {
            unit_file: self.config.identity.unit_path.exists(),
            env_file: self.config.identity.env_file_path.exists(),
        }
    }

    /// Prints installed files and the supervisor's report. Never fails.
    pub fn status(&self) {
        let identity = &self.config.identity;
        let artifacts = self.artifacts();
        println!(
            "Unit file: {} ({})",
            identity.unit_path.display(),
            presence(artifacts.unit_file)
        );
        println!(
            "Env file:  {} ({})",
            identity.env_file_path.display(),
            presence(artifacts.env_file)
        );

        let unit = self.unit();
        if let Err(err) = self.supervisor.query_status(&unit) {
            warn!("{unit} is not running or its status is unavailable: {err}");
        }
    }

    /// Follows the service log until interrupted.
    pub fn logs(&self) -> Result<(), ManagerError> {
        self.supervisor.stream_logs(&self.unit())
    }

    /// Removes the service and its files. Safe to run when nothing is installed.
    ///
    /// The env file is removed even when the daemon reload fails; the reload
    /// error is returned afterwards.
    pub fn uninstall(&self) -> Result<UninstallReport, ManagerError> {
        let identity = &self.config.identity;
        let _lock = InstallLock::acquire(&self.config.lock_path)?;
        let unit = self.unit();

        if let Err(err) = self.supervisor.deregister(&unit) {
            warn!("could not disable {unit} (it may not be installed): {err}");
        }

        let mut report = UninstallReport::default();
        if remove_if_present(&identity.unit_path)? {
            report.removed.push(identity.unit_path.clone());
        }

        let reloaded = self.supervisor.reload();

        if remove_if_present(&identity.env_file_path)? {
            report.removed.push(identity.env_file_path.clone());
        }

        if report.is_empty() {
            println!("Nothing to remove for {unit}");
        } else {
            for path in &report.removed {
                println!("Removed {}", path.display());
            }
        }
        reloaded?;
        Ok(report)
    }
}

fn presence(exists: bool) -> &'static str {
    if exists { "present" } else { "absent" }
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

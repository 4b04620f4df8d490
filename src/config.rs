//! Resolution of paths and identities for a single invocation.
use std::{
    env,
    path::{Path, PathBuf},
};

use nix::unistd::{Uid, User};

use crate::constants::{
    DEFAULT_ENV_DIR, DEFAULT_LOCK_DIR, DEFAULT_UNIT_DIR, ENTRYPOINT_RELATIVE_PATH,
    ENV_DIR_VAR, ENV_FILE_SUFFIX, INTERPRETER_RELATIVE_PATH, LOCK_DIR_VAR,
    LOCK_FILE_SUFFIX, PYTHON_VAR, REPO_ROOT_VAR, SERVICE_NAME, SERVICE_USER_VAR,
    SUDO_USER_VAR, TEMPLATE_RELATIVE_PATH, UNIT_DIR_VAR, UNIT_SUFFIX,
};
use crate::error::ManagerError;

/// Name and file locations of the managed service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    /// Service name without the `.service` suffix.
    pub name: String,
    /// Where the rendered unit is installed.
    pub unit_path: PathBuf,
    /// Where the secret environment file is installed.
    pub env_file_path: PathBuf,
    /// Template the unit is rendered from.
    pub template_path: PathBuf,
}

impl ServiceIdentity {
    /// Unit name as systemd knows it, e.g. `dtek-bot.service`.
    pub fn unit_name(&self) -> String {
        format!("{}{}", self.name, UNIT_SUFFIX)
    }
}

/// Values describing how the service process is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeContext {
    /// Checkout of the bot; used as the working directory.
    pub repo_root: PathBuf,
    /// Account the service runs as.
    pub invoking_user: String,
    /// Interpreter that runs the entrypoint.
    pub interpreter_path: PathBuf,
    /// Script the interpreter runs.
    pub entrypoint_path: PathBuf,
}

/// Everything a subcommand needs, resolved once per invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Service naming and installed file locations.
    pub identity: ServiceIdentity,
    /// Launch parameters substituted into the unit.
    pub runtime: RuntimeContext,
    /// Lock serializing install and uninstall.
    pub lock_path: PathBuf,
    /// Owner (uid, gid) given to the secret file; `None` leaves it unchanged.
    pub secret_owner: Option<(u32, u32)>,
}

/// Ambient inputs to [`Config::resolve`], captured up front so resolution is pure.
#[derive(Debug, Clone, Default)]
pub struct ResolverInputs {
    /// Location of the running executable.
    pub exe_path: Option<PathBuf>,
    /// Explicit repository root.
    pub repo_root: Option<PathBuf>,
    /// Explicit interpreter.
    pub python: Option<PathBuf>,
    /// Explicit service account.
    pub service_user: Option<String>,
    /// Account that invoked sudo, if any.
    pub sudo_user: Option<String>,
    /// Name of the real user running the process.
    pub current_user: Option<String>,
    /// Directory overrides.
    pub unit_dir: Option<PathBuf>,
    pub env_dir: Option<PathBuf>,
    pub lock_dir: Option<PathBuf>,
}

impl ResolverInputs {
    /// Snapshots the process environment.
    pub fn from_process() -> Self {
        Self {
            exe_path: env::current_exe().ok(),
            repo_root: non_empty_var(REPO_ROOT_VAR).map(PathBuf::from),
            python: non_empty_var(PYTHON_VAR).map(PathBuf::from),
            service_user: non_empty_var(SERVICE_USER_VAR),
            sudo_user: non_empty_var(SUDO_USER_VAR),
            current_user: User::from_uid(Uid::current())
                .ok()
                .flatten()
                .map(|user| user.name),
            unit_dir: non_empty_var(UNIT_DIR_VAR).map(PathBuf::from),
            env_dir: non_empty_var(ENV_DIR_VAR).map(PathBuf::from),
            lock_dir: non_empty_var(LOCK_DIR_VAR).map(PathBuf::from),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    /// Resolves the configuration from the current process.
    pub fn from_process() -> Result<Self, ManagerError> {
        Self::resolve(ResolverInputs::from_process())
    }

    /// Resolves identity and runtime paths from captured inputs.
    pub fn resolve(inputs: ResolverInputs) -> Result<Self, ManagerError> {
        let repo_root = match inputs.repo_root {
            Some(root) => root,
            None => repo_root_from_exe(inputs.exe_path.as_deref())?,
        };

        let invoking_user = inputs
            .service_user
            .or(inputs.sudo_user.filter(|user| user != "root"))
            .or(inputs.current_user)
            .ok_or_else(|| {
                ManagerError::Configuration(
                    "unable to determine which user the service should run as".into(),
                )
            })?;

        let unit_dir = inputs
            .unit_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UNIT_DIR));
        let env_dir = inputs
            .env_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_DIR));
        let lock_dir = inputs
            .lock_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCK_DIR));

        let identity = ServiceIdentity {
            name: SERVICE_NAME.to_string(),
            unit_path: unit_dir.join(format!("{SERVICE_NAME}{UNIT_SUFFIX}")),
            env_file_path: env_dir.join(format!("{SERVICE_NAME}{ENV_FILE_SUFFIX}")),
            template_path: repo_root.join(TEMPLATE_RELATIVE_PATH),
        };

        let runtime = RuntimeContext {
            interpreter_path: inputs
                .python
                .unwrap_or_else(|| repo_root.join(INTERPRETER_RELATIVE_PATH)),
            entrypoint_path: repo_root.join(ENTRYPOINT_RELATIVE_PATH),
            invoking_user,
            repo_root,
        };

        Ok(Self {
            identity,
            runtime,
            lock_path: lock_dir.join(format!("{SERVICE_NAME}{LOCK_FILE_SUFFIX}")),
            secret_owner: Some((0, 0)),
        })
    }
}

/// The tool lives one level below the checkout (`<repo>/bin/botctl`).
fn repo_root_from_exe(exe: Option<&Path>) -> Result<PathBuf, ManagerError> {
    let exe = exe.ok_or_else(|| {
        ManagerError::Configuration("unable to determine the executable location".into())
    })?;

    exe.parent()
        .and_then(Path::parent)
        .filter(|root| !root.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            ManagerError::Configuration(format!(
                "cannot derive repository root from {}; set {REPO_ROOT_VAR}",
                exe.display()
            ))
        })
}

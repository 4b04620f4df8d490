//! Crash-safe file replacement and the install lock.
use std::{
    fs::{self, File, OpenOptions, Permissions},
    io::Write,
    os::unix::fs::{PermissionsExt, fchown},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::ManagerError;

/// Replaces `path` with `contents` so readers see either the old or new file.
///
/// The temporary sibling is created with mode 0600 by `tempfile`, then
/// narrowed or widened to `mode` and chowned to `owner` before any byte is
/// written, so secret content is never exposed under looser permissions.
pub fn write_atomic(
    path: &Path,
    contents: &[u8],
    mode: u32,
    owner: Option<(u32, u32)>,
) -> Result<(), ManagerError> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|err| ManagerError::io(dir, err))?;

    let mut temp =
        NamedTempFile::new_in(dir).map_err(|err| ManagerError::io(path, err))?;

    temp.as_file()
        .set_permissions(Permissions::from_mode(mode))
        .map_err(|err| ManagerError::io(temp.path(), err))?;
    if let Some((uid, gid)) = owner {
        fchown(temp.as_file(), Some(uid), Some(gid))
            .map_err(|err| ManagerError::io(temp.path(), err))?;
    }

    temp.write_all(contents)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|err| ManagerError::io(temp.path(), err))?;

    temp.persist(path)
        .map_err(|err| ManagerError::io(path, err.error))?;
    debug!("replaced {} (mode {mode:o})", path.display());
    Ok(())
}

/// Removes `path`, reporting whether anything was there.
pub fn remove_if_present(path: &Path) -> Result<bool, ManagerError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(ManagerError::io(path, err)),
    }
}

/// Exclusive advisory lock held for the duration of install or uninstall.
///
/// Released when dropped. The lock file itself is left in place.
#[derive(Debug)]
pub struct InstallLock {
    file: File,
    path: PathBuf,
}

impl InstallLock {
    /// Blocks until the lock at `path` is held by this process.
    pub fn acquire(path: &Path) -> Result<Self, ManagerError> {
        let lock_err = |source| ManagerError::Lock {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(lock_err)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(lock_err)?;

        debug!("waiting for lock {}", path.display());
        FileExt::lock_exclusive(&file).map_err(lock_err)?;
        debug!("acquired lock {}", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Lock file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

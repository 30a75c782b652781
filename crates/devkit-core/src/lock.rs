use crate::error::{DevkitError, Result};
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Who holds the lock, as written into the lock file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockHolder {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
}

/// Exclusive hold on `.devkit/setup.lock` for the duration of one setup run.
///
/// The file is created with `create_new`, so a second concurrent setup fails
/// with `SetupLocked` instead of racing on the marker and env file. Dropping
/// the guard removes the file. An interrupted run never gets to drop it, so
/// a lock whose recorded process is gone is taken over.
#[derive(Debug)]
pub struct SetupLock {
    path: PathBuf,
}

impl SetupLock {
    pub fn acquire(root: &Path) -> Result<Self> {
        let path = paths::lock_path(root);
        crate::io::ensure_dir(&paths::devkit_dir(root))?;

        match Self::create(&path) {
            Err(DevkitError::SetupLocked { .. }) if Self::is_stale(&path) => {
                tracing::warn!(path = %path.display(), "taking over setup lock left by an interrupted run");
                crate::io::remove_file_if_exists(&path)?;
                Self::create(&path)
            }
            other => other,
        }
    }

    fn create(path: &Path) -> Result<Self> {
        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(DevkitError::SetupLocked {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let holder = LockHolder {
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };
        file.write_all(serde_yaml::to_string(&holder)?.as_bytes())?;
        tracing::debug!(path = %path.display(), pid = holder.pid, "setup lock acquired");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// The recorded holder, if the lock file exists and names one.
    pub fn holder(path: &Path) -> Option<LockHolder> {
        let data = std::fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&data).ok()
    }

    /// A lock is stale only when it names a process that is provably gone.
    /// Unreadable or half-written files count as held.
    fn is_stale(path: &Path) -> bool {
        Self::holder(path).is_some_and(|h| !process_alive(h.pid))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SetupLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release setup lock");
        }
    }
}

/// Whether `pid` names a running process. Without `/proc` there is no way to
/// tell, so every process is assumed alive.
fn process_alive(pid: u32) -> bool {
    let proc_root = Path::new("/proc");
    if !proc_root.is_dir() {
        return true;
    }
    proc_root.join(pid.to_string()).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_holder(root: &Path, pid: u32) {
        std::fs::create_dir_all(paths::devkit_dir(root)).unwrap();
        let holder = LockHolder {
            pid,
            acquired_at: Utc::now(),
        };
        std::fs::write(
            paths::lock_path(root),
            serde_yaml::to_string(&holder).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn second_acquire_fails_until_released() {
        let dir = TempDir::new().unwrap();
        let lock = SetupLock::acquire(dir.path()).unwrap();
        assert!(lock.path().exists());

        assert!(matches!(
            SetupLock::acquire(dir.path()),
            Err(DevkitError::SetupLocked { .. })
        ));

        drop(lock);
        assert!(!paths::lock_path(dir.path()).exists());
        SetupLock::acquire(dir.path()).unwrap();
    }

    #[test]
    fn lock_file_records_current_process() {
        let dir = TempDir::new().unwrap();
        let lock = SetupLock::acquire(dir.path()).unwrap();
        let holder = SetupLock::holder(lock.path()).unwrap();
        assert_eq!(holder.pid, std::process::id());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn lock_from_dead_process_is_taken_over() {
        let dir = TempDir::new().unwrap();
        // Above the kernel's pid_max ceiling, so never a live process.
        write_holder(dir.path(), u32::MAX);

        let lock = SetupLock::acquire(dir.path()).unwrap();

        let holder = SetupLock::holder(lock.path()).unwrap();
        assert_eq!(holder.pid, std::process::id());
    }

    #[test]
    fn lock_from_live_process_is_respected() {
        let dir = TempDir::new().unwrap();
        write_holder(dir.path(), std::process::id());

        assert!(matches!(
            SetupLock::acquire(dir.path()),
            Err(DevkitError::SetupLocked { .. })
        ));
        assert!(paths::lock_path(dir.path()).exists());
    }

    #[test]
    fn unreadable_lock_is_respected() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(paths::devkit_dir(dir.path())).unwrap();
        std::fs::write(paths::lock_path(dir.path()), "").unwrap();

        assert!(matches!(
            SetupLock::acquire(dir.path()),
            Err(DevkitError::SetupLocked { .. })
        ));
    }
}

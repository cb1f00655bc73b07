//! Single-instance run lock.
//!
//! A PID file taken before the ledger is loaded, so two runs never
//! interleave their load-modify-save of the ledger.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use tracing::{debug, info, warn};

use crate::error::{RunnerError, RunnerResult};

/// File name of the lock inside the data directory.
pub const LOCK_FILE_NAME: &str = "run.lock";

/// Run lock held for the duration of a run. Released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Takes the lock at `path`.
    ///
    /// A lock left behind by a process that is no longer alive, or one that
    /// does not contain a PID, is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::AlreadyRunning`] if a live process holds it.
    pub fn acquire(path: impl Into<PathBuf>) -> RunnerResult<Self> {
        let path = path.into();

        if path.exists() {
            match Self::read_pid(&path) {
                Some(pid) if Self::is_process_running(pid) => {
                    return Err(RunnerError::already_running(path.to_string_lossy()));
                }
                Some(pid) => {
                    warn!(path = %path.display(), pid, "removing stale run lock");
                    fs::remove_file(&path)?;
                }
                None => {
                    warn!(path = %path.display(), "removing unreadable run lock");
                    fs::remove_file(&path)?;
                }
            }
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let pid = process::id();
        let mut file = File::options().write(true).create_new(true).open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                RunnerError::already_running(path.to_string_lossy())
            } else {
                RunnerError::Io(e)
            }
        })?;
        writeln!(file, "{pid}")?;
        file.sync_all()?;

        info!(path = %path.display(), pid, "acquired run lock");
        Ok(Self { path })
    }

    /// Takes the lock in the data directory.
    pub fn acquire_in(data_dir: &Path) -> RunnerResult<Self> {
        Self::acquire(data_dir.join(LOCK_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_pid(path: &Path) -> Option<u32> {
        fs::read_to_string(path).ok()?.trim().parse().ok()
    }

    #[cfg(unix)]
    fn is_process_running(pid: u32) -> bool {
        if pid == process::id() {
            return true;
        }
        // Signal 0 only checks that the process exists.
        unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
    }

    #[cfg(not(unix))]
    fn is_process_running(_pid: u32) -> bool {
        true
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove run lock");
        } else {
            debug!(path = %self.path.display(), "released run lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_and_release() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.lock");
        {
            let lock = RunLock::acquire(&path).unwrap();
            assert_eq!(lock.path(), path);
            let stored: u32 = fs::read_to_string(&path).unwrap().trim().parse().unwrap();
            assert_eq!(stored, process::id());
        }
        assert!(!path.exists());
    }

    #[test]
    fn rejects_second_run() {
        let dir = tempdir().unwrap();
        let _lock = RunLock::acquire_in(dir.path()).unwrap();
        let result = RunLock::acquire_in(dir.path());
        assert!(matches!(result, Err(RunnerError::AlreadyRunning { .. })));
    }

    #[test]
    fn replaces_stale_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.lock");
        fs::write(&path, "999999999\n").unwrap();
        let lock = RunLock::acquire(&path).unwrap();
        assert!(path.exists());
        drop(lock);
    }

    #[test]
    fn replaces_unreadable_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.lock");
        fs::write(&path, "not-a-pid\n").unwrap();
        assert!(RunLock::acquire(&path).is_ok());
    }

    #[test]
    fn creates_data_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("state");
        let _lock = RunLock::acquire_in(&nested).unwrap();
        assert!(nested.join(LOCK_FILE_NAME).exists());
    }
}

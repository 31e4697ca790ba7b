//! # Lock-Guarded Registry Store
//!
//! Every mutation of the registry file is a read-modify-write performed
//! under an exclusive lock file (`<registry>.lock`). The lock is taken with
//! create-new semantics, retried until a timeout, and removed when the guard
//! drops. Writes go to a temporary file in the same directory and are
//! renamed over the registry, so readers never see a partial document.
//!
//! ## Recovery
//!
//! The lock file records the owning process and when it was taken. A lock
//! whose owner has exited, or which is older than the stale threshold, is
//! removed with a warning and the acquisition retried. A lock file with an
//! unreadable record is aged by its modification time.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use credkit_core::Timestamp;

use crate::error::StatusError;
use crate::registry::StatusRegistry;

/// Default wait for a contended lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Default age after which a held lock is presumed abandoned.
pub const DEFAULT_STALE_LOCK_AGE: Duration = Duration::from_secs(600);

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// File-backed status registry.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
    lock_timeout: Duration,
    stale_lock_age: Duration,
}

impl RegistryStore {
    /// A store for the registry at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            stale_lock_age: DEFAULT_STALE_LOCK_AGE,
        }
    }

    /// Override the lock timeout.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Override the age at which a lock left by another process is taken over.
    pub fn with_stale_lock_age(mut self, age: Duration) -> Self {
        self.stale_lock_age = age;
        self
    }

    /// The registry file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Read the registry. A missing file is an empty registry.
    pub fn load(&self) -> Result<StatusRegistry, StatusError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "registry file absent, starting empty");
                return Ok(StatusRegistry::new());
            }
            Err(e) => return Err(e.into()),
        };
        let registry: StatusRegistry = serde_json::from_str(&raw)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Apply `f` to the registry under the lock. The registry is written
    /// back only if `f` succeeds and changed it.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut StatusRegistry) -> Result<T, StatusError>,
    ) -> Result<T, StatusError> {
        let _guard = LockGuard::acquire(&self.lock_path(), self.lock_timeout, self.stale_lock_age)?;
        let mut registry = self.load()?;
        let before = registry.clone();
        let out = f(&mut registry)?;
        if registry != before {
            self.save(&registry)?;
        }
        Ok(out)
    }

    fn save(&self, registry: &StatusRegistry) -> Result<(), StatusError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, registry)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StatusError::Io(e.error))?;
        tracing::debug!(path = %self.path.display(), entries = registry.len(), "registry saved");
        Ok(())
    }
}

/// Contents of a lock file.
#[derive(Debug, Serialize, Deserialize)]
struct LockOwner {
    pid: u32,
    acquired_at: Timestamp,
}

/// What a contended lock file turned out to be.
#[derive(Debug)]
enum LockState {
    /// Removed by its owner since the failed attempt.
    Released,
    /// Legitimately held.
    Held,
    /// Abandoned, with the reason it was judged so.
    Stale(String),
}

/// Exclusive lock file, removed on drop.
#[derive(Debug)]
struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    fn acquire(path: &Path, timeout: Duration, stale_age: Duration) -> Result<Self, StatusError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let started = Instant::now();
        loop {
            match fs::OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut f) => {
                    // Dropping the guard on a failed write removes the file.
                    let guard = Self {
                        path: path.to_path_buf(),
                    };
                    let owner = LockOwner {
                        pid: std::process::id(),
                        acquired_at: Timestamp::now(),
                    };
                    serde_json::to_writer(&mut f, &owner)?;
                    f.sync_all()?;
                    return Ok(guard);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    match inspect_lock(path, stale_age)? {
                        LockState::Released => continue,
                        LockState::Stale(reason) => {
                            tracing::warn!(
                                path = %path.display(),
                                %reason,
                                "taking over stale registry lock"
                            );
                            match fs::remove_file(path) {
                                Ok(()) => continue,
                                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                                Err(e) => return Err(e.into()),
                            }
                        }
                        LockState::Held => {}
                    }
                    if started.elapsed() >= timeout {
                        return Err(StatusError::LockTimeout {
                            path: path.display().to_string(),
                            waited_secs: started.elapsed().as_secs(),
                        });
                    }
                    std::thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove registry lock");
        }
    }
}

fn inspect_lock(path: &Path, stale_age: Duration) -> Result<LockState, StatusError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LockState::Released),
        Err(e) => return Err(e.into()),
    };
    let age_secs = match serde_json::from_str::<LockOwner>(&raw) {
        Ok(owner) => {
            if !process_alive(owner.pid) {
                return Ok(LockState::Stale(format!("owner process {} has exited", owner.pid)));
            }
            let age = Timestamp::now().epoch_secs() - owner.acquired_at.epoch_secs();
            u64::try_from(age).unwrap_or(0)
        }
        // Empty or partial record: the owner died before finishing the write,
        // or the file predates the record format.
        Err(_) => {
            let modified = match fs::metadata(path).and_then(|m| m.modified()) {
                Ok(t) => t,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LockState::Released),
                Err(e) => return Err(e.into()),
            };
            modified.elapsed().map(|d| d.as_secs()).unwrap_or(0)
        }
    };
    if age_secs >= stale_age.as_secs() {
        Ok(LockState::Stale(format!("held for {age_secs}s")))
    } else {
        Ok(LockState::Held)
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    match i32::try_from(pid) {
        // Zero and negative values address process groups, not a process.
        Ok(raw) if raw > 0 => !matches!(kill(Pid::from_raw(raw), None), Err(Errno::ESRCH)),
        Ok(_) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

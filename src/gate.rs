//! Single-poller gate.
//!
//! Only one process of a fleet may poll Telegram at a time. The gate is a
//! lock file created with an atomic create-if-absent; its content is the
//! holder's PID as plain text so operators can see who holds it.
//!
//! Acquiring returns a [`PollerGuard`]. Dropping the guard (or calling
//! [`PollerGuard::release`]) removes the lock file, so the lock is released
//! on every exit path that unwinds. A process killed without unwinding
//! leaves a stale file behind; [`SingletonGate::clear`] removes it.
//!
//! # Example
//!
//! ```no_run
//! use mork_coord::gate::{Acquisition, SingletonGate};
//!
//! let gate = SingletonGate::new("/tmp/mork_poller.lock");
//! match gate.acquire()? {
//!     Acquisition::Acquired(_guard) => {
//!         // poll until shutdown; the lock is released when `_guard` drops
//!     }
//!     Acquisition::Held { holder } => {
//!         eprintln!("another poller is active: {holder:?}");
//!     }
//! }
//! # Ok::<(), mork_coord::error::GateError>(())
//! ```


use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::GateConfig;
use crate::error::GateError;

/// Outcome of [`SingletonGate::acquire`].
#[derive(Debug)]
#[must_use = "dropping an acquired gate releases it immediately"]
pub enum Acquisition {
    /// This process now holds the gate.
    Acquired(PollerGuard),
    /// Another holder already has the lock file.
    Held {
        /// PID recorded in the lock file, if readable.
        holder: Option<u32>,
    },
}

impl Acquisition {
    #[must_use]
    pub fn is_acquired(&self) -> bool {
        matches!(self, Self::Acquired(_))
    }

    /// The guard, if the gate was acquired.
    #[must_use]
    pub fn into_guard(self) -> Option<PollerGuard> {
        match self {
            Self::Acquired(guard) => Some(guard),
            Self::Held { .. } => None,
        }
    }
}

/// Observed state of the lock file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Free,
    Held {
        /// PID recorded in the lock file, if parseable.
        pid: Option<u32>,
        /// Whether that process is still running; `None` when unknown.
        alive: Option<bool>,
    },
}

/// Cross-process mutual exclusion on a lock file path.
#[derive(Debug, Clone)]
pub struct SingletonGate {
    path: PathBuf,
}

impl SingletonGate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.lock_path.clone())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Try to become the active poller.
    ///
    /// Creates the lock file if and only if it does not exist, in a single
    /// atomic operation, and writes this process's PID into it. An existing
    /// file yields [`Acquisition::Held`], even if this process created it.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Access`] when the file cannot be created or
    /// written for any reason other than already existing (for example a
    /// missing directory or denied permission).
    pub fn acquire(&self) -> Result<Acquisition, GateError> {
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = self.holder();
                debug!(path = %self.path.display(), holder = ?holder, "Poller lock already held");
                return Ok(Acquisition::Held { holder });
            }
            Err(source) => {
                return Err(GateError::Access {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let pid = std::process::id();
        if let Err(source) = write!(file, "{pid}").and_then(|()| file.flush()) {
            drop(file);
            let _ = fs::remove_file(&self.path);
            return Err(GateError::Access {
                path: self.path.clone(),
                source,
            });
        }

        info!(path = %self.path.display(), pid, "Poller lock acquired");
        Ok(Acquisition::Acquired(PollerGuard {
            path: self.path.clone(),
            file: Some(file),
            pid,
        }))
    }

    /// PID recorded in the lock file, if the file exists and parses.
    #[must_use]
    pub fn holder(&self) -> Option<u32> {
        read_pid(&self.path)
    }

    /// Inspect the lock file without modifying it.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Access`] if the file exists but cannot be read.
    pub fn status(&self) -> Result<LockStatus, GateError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let pid = content.trim().parse::<u32>().ok();
                Ok(LockStatus::Held {
                    pid,
                    alive: pid.and_then(process_alive),
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(LockStatus::Free),
            Err(source) => Err(GateError::Access {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Remove a stale lock file left by a holder that died without
    /// releasing.
    ///
    /// Refuses while the recorded holder is known to be alive unless `force`
    /// is set. Returns whether a file was removed.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::HolderAlive`] for a live holder without `force`,
    /// or [`GateError::Access`] if the file cannot be inspected or removed.
    pub fn clear(&self, force: bool) -> Result<bool, GateError> {
        match self.status()? {
            LockStatus::Free => return Ok(false),
            LockStatus::Held {
                pid: Some(pid),
                alive: Some(true),
            } if !force => return Err(GateError::HolderAlive { pid }),
            LockStatus::Held { pid, .. } => {
                warn!(path = %self.path.display(), pid = ?pid, force, "Clearing poller lock");
            }
        }

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(GateError::Access {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Proof of holding the gate. Releases the lock file when dropped.
#[derive(Debug)]
pub struct PollerGuard {
    path: PathBuf,
    file: Option<File>,
    pid: u32,
}

impl PollerGuard {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Whether [`release`](Self::release) has not run yet.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Release the gate. Best effort and idempotent: closes the handle and
    /// removes the lock file if it is still the file this guard created.
    /// Never fails.
    pub fn release(&mut self) {
        let Some(handle) = self.file.take() else {
            return;
        };

        // Compared while the handle is open so the inode cannot be recycled.
        let ours = owns_path(&handle, &self.path, self.pid);
        let mut handle = Some(handle);
        if !ours || cfg!(not(unix)) {
            // non-unix platforms cannot unlink an open file
            handle.take();
        }
        if !ours {
            debug!(path = %self.path.display(), "Poller lock no longer ours, leaving it");
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "Poller lock released"),
            Err(e) => debug!(path = %self.path.display(), error = %e, "Poller lock removal failed"),
        }
        drop(handle);
    }
}

impl Drop for PollerGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Whether `path` still names the file behind `handle`.
///
/// A PID alone does not identify the holder: a cleared lock may be re-created
/// by another guard of the same process, or by a process with the same PID in
/// another PID namespace.
#[cfg(unix)]
fn owns_path(handle: &File, path: &Path, _pid: u32) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (handle.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(current)) => held.dev() == current.dev() && held.ino() == current.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn owns_path(_handle: &File, path: &Path, pid: u32) -> bool {
    read_pid(path) == Some(pid)
}

fn read_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Whether `pid` names a running process.
#[cfg(unix)]
fn process_alive(pid: u32) -> Option<bool> {
    let pid = libc::pid_t::try_from(pid).ok().filter(|p| *p > 0)?;
    // Signal 0 only checks that the process exists and may be signalled.
    let rc = unsafe { libc::kill(pid, 0) };
    if rc == 0 {
        return Some(true);
    }
    match std::io::Error::last_os_error().raw_os_error() {
        Some(libc::EPERM) => Some(true),
        Some(libc::ESRCH) => Some(false),
        _ => None,
    }
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> Option<bool> {
    None
}

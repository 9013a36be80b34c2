//! Singleton gate configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Environment variable overriding [`GateConfig::lock_path`].
pub const LOCK_PATH_ENV: &str = "MORK_POLLER_LOCK";

const DEFAULT_LOCK_FILE: &str = "mork_poller.lock";

/// Singleton gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Path of the lock file (default: `<temp dir>/mork_poller.lock`).
    #[serde(default = "default_lock_path")]
    pub lock_path: PathBuf,
}

fn default_lock_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_LOCK_FILE)
}

impl GateConfig {
    /// Replace the lock path with `MORK_POLLER_LOCK` when it is set and
    /// non-empty.
    pub fn apply_env(&mut self) {
        if let Some(path) = std::env::var_os(LOCK_PATH_ENV).filter(|p| !p.is_empty()) {
            self.lock_path = PathBuf::from(path);
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            lock_path: default_lock_path(),
        }
    }
}

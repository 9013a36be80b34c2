//! Error types for configuration, the poller gate and the CLI.
//!
//! Bus publishing has no error type: subscriber failures are logged and
//! counted, never returned to the publisher.

use std::path::PathBuf;

use thiserror::Error;

/// Problems loading or validating `mork.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting is absent or empty.
    #[error("config setting `{field}` must be set")]
    MissingField { field: &'static str },

    #[error("config setting `{field}` is invalid: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("cannot read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("malformed config file: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Singleton gate errors.
///
/// Contention is not an error: it is reported through
/// [`Acquisition::Held`](crate::gate::Acquisition::Held).
#[derive(Error, Debug)]
pub enum GateError {
    /// The lock path could not be created, written or inspected for a
    /// reason other than another process already holding it.
    #[error("cannot access lock file {}: {source}", .path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `clear` without `force` found the recorded holder still running.
    #[error("poller lock belongs to running process {pid}")]
    HolderAlive { pid: u32 },
}

/// Any failure surfaced by the `mork-coord` binary.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gate(#[from] GateError),

    /// A replay file line or payload that is not valid JSON.
    #[error("bad event JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

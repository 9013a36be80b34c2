//! Handlers for the `gate` command group.

use std::time::Duration;

use tokio::signal;
use tracing::info;

use crate::error::Result;
use crate::gate::{Acquisition, LockStatus, SingletonGate};

/// How `gate hold` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldOutcome {
    /// The lock was held and then released.
    Released,
    /// Another process holds the lock.
    Contended,
}

/// Execute `gate status`.
pub fn execute_status(gate: &SingletonGate) -> Result<()> {
    let path = gate.path().display();
    match gate.status()? {
        LockStatus::Free => println!("free ({path})"),
        LockStatus::Held { pid, alive } => {
            let holder = pid.map_or_else(|| "unknown pid".to_string(), |p| format!("pid {p}"));
            let state = match alive {
                Some(true) => "running",
                Some(false) => "stale",
                None => "unknown",
            };
            println!("held by {holder} [{state}] ({path})");
        }
    }
    Ok(())
}

/// Execute `gate hold`.
pub async fn execute_hold(gate: &SingletonGate, for_secs: Option<u64>) -> Result<HoldOutcome> {
    let mut guard = match gate.acquire()? {
        Acquisition::Acquired(guard) => guard,
        Acquisition::Held { holder } => {
            match holder {
                Some(pid) => println!("already held by pid {pid} ({})", gate.path().display()),
                None => println!("already held ({})", gate.path().display()),
            }
            return Ok(HoldOutcome::Contended);
        }
    };
    println!("acquired by pid {} ({})", guard.pid(), guard.path().display());

    match for_secs {
        Some(secs) => {
            tokio::select! {
                () = tokio::time::sleep(Duration::from_secs(secs)) => {}
                result = signal::ctrl_c() => {
                    result?;
                    info!("Shutdown signal received");
                }
            }
        }
        None => {
            signal::ctrl_c().await?;
            info!("Shutdown signal received");
        }
    }

    guard.release();
    println!("released");
    Ok(HoldOutcome::Released)
}

/// Execute `gate clear`.
pub fn execute_clear(gate: &SingletonGate, force: bool) -> Result<()> {
    if gate.clear(force)? {
        println!("cleared ({})", gate.path().display());
    } else {
        println!("nothing to clear ({})", gate.path().display());
    }
    Ok(())
}

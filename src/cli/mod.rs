//! Command-line interface definitions.

pub mod bus;
pub mod config;
pub mod gate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Operator tooling for the Mork notification bus and poller lock.
#[derive(Parser, Debug)]
#[command(name = "mork-coord")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML config file (defaults plus environment when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect or hold the single-poller lock
    #[command(subcommand)]
    Gate(GateCommand),

    /// Exercise the notification bus
    #[command(subcommand)]
    Bus(BusCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `mork-coord gate`
#[derive(Subcommand, Debug)]
pub enum GateCommand {
    /// Show who holds the lock
    Status,
    /// Acquire the lock and hold it until Ctrl-C
    Hold(HoldArgs),
    /// Remove a stale lock left by a dead poller
    Clear(ClearArgs),
}

/// Arguments for `gate hold`
#[derive(Parser, Debug)]
pub struct HoldArgs {
    /// Release after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub for_secs: Option<u64>,
}

/// Arguments for `gate clear`
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Remove the lock even if its holder is still running
    #[arg(long)]
    pub force: bool,
}

/// Subcommands for `mork-coord bus`
#[derive(Subcommand, Debug)]
pub enum BusCommand {
    /// Replay captured events (JSON lines of {"topic", "payload"}) and
    /// report what deduplication lets through
    Replay(ReplayArgs),
}

/// Arguments for `bus replay`
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// File with one JSON event per line
    pub file: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Subcommands for `mork-coord config`
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Load and validate the configuration, then print it
    Validate,
}

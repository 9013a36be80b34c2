//! mork-coord - coordination core of the Mork trading bot.
//!
//! Two independent building blocks used by the bot's processes:
//!
//! - **[`bus`]** - in-process publish/subscribe with content-based
//!   deduplication. Scanners, webhook handlers and the trade engine publish;
//!   the admin notifier, loggers and legacy queue listeners subscribe.
//! - **[`gate`]** - cross-process lock file that lets exactly one process act
//!   as the Telegram poller.
//!
//! # Modules
//!
//! - [`bus`] - `NotificationBus`, subscribers, dedup keys, legacy queues
//! - [`gate`] - `SingletonGate` and its release-on-drop `PollerGuard`
//! - [`config`] - Configuration loading from TOML with environment overrides
//! - [`error`] - Error types for the crate
//! - [`cli`] - Operator command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mork_coord::bus::NotificationBus;
//! use mork_coord::config::Config;
//! use mork_coord::gate::{Acquisition, SingletonGate};
//!
//! let config = Config::from_env();
//! let bus = Arc::new(NotificationBus::new(&config.bus));
//! let gate = SingletonGate::from_config(&config.gate);
//!
//! if let Acquisition::Acquired(_guard) = gate.acquire()? {
//!     // run the poll loop, handing `bus` to producers
//! }
//! # Ok::<(), mork_coord::error::Error>(())
//! ```

pub mod bus;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;

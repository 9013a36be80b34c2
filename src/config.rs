//! Configuration loading and validation.
//!
//! Settings are read from an optional TOML file, then environment overrides
//! are applied. Every section has defaults, so an empty file (or no file at
//! all) yields a working configuration.

pub mod bus;
pub mod gate;
pub mod logging;
pub mod settings;

pub use bus::BusConfig;
pub use gate::{GateConfig, LOCK_PATH_ENV};
pub use logging::LoggingConfig;
pub use settings::Config;

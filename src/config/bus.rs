//! Notification bus configuration.

use serde::Deserialize;

/// Notification bus configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    /// Number of distinct dedup keys remembered (default: 2048).
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    /// Dedup bucket length in seconds (default: 300).
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,
    /// Capacity of each legacy queue receiver (default: 500).
    #[serde(default = "default_legacy_queue_capacity")]
    pub legacy_queue_capacity: usize,
}

const fn default_cache_size() -> usize {
    2048
}

const fn default_dedup_window_secs() -> u64 {
    300
}

const fn default_legacy_queue_capacity() -> usize {
    500
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            cache_size: default_cache_size(),
            dedup_window_secs: default_dedup_window_secs(),
            legacy_queue_capacity: default_legacy_queue_capacity(),
        }
    }
}

//! Handler for the `config` command group.

use crate::config::Config;
use crate::error::Result;

/// Execute `config validate` on an already loaded configuration.
pub fn execute_validate(config: &Config) -> Result<()> {
    println!("configuration ok");
    println!("  bus.cache_size            {}", config.bus.cache_size);
    println!("  bus.dedup_window_secs     {}", config.bus.dedup_window_secs);
    println!("  bus.legacy_queue_capacity {}", config.bus.legacy_queue_capacity);
    println!("  gate.lock_path            {}", config.gate.lock_path.display());
    println!(
        "  logging                   {} ({})",
        config.logging.level, config.logging.format
    );
    Ok(())
}

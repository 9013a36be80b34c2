//! Handler for the `bus` command group.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::bus::{BusStats, Event, LogSubscriber, NotificationBus, Subscriber};
use crate::config::BusConfig;
use crate::error::Result;

/// Summary printed by `bus replay`.
#[derive(Debug, Serialize)]
pub struct ReplaySummary {
    /// Lines read, including blank and malformed ones.
    pub lines: usize,
    /// Lines that could not be parsed as an event.
    pub malformed: usize,
    #[serde(flatten)]
    pub stats: BusStats,
}

/// Execute `bus replay`.
///
/// Every topic seen in the file gets a logging subscriber, so deliveries show
/// up in the log at `info` level.
pub fn execute_replay(path: &Path, config: &BusConfig, json: bool) -> Result<ReplaySummary> {
    let content = fs::read_to_string(path)?;
    let bus = NotificationBus::new(config);
    let logger: Arc<dyn Subscriber> = Arc::new(LogSubscriber);

    let mut lines = 0;
    let mut malformed = 0;
    for (index, line) in content.lines().enumerate() {
        lines += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: Event = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                malformed += 1;
                warn!(line = index + 1, error = %e, "Skipping malformed event");
                continue;
            }
        };
        if bus.subscriber_count(&event.topic) == 0 {
            bus.subscribe_handler(&event.topic, logger.clone());
        }
        bus.publish(&event.topic, event.payload);
    }

    let summary = ReplaySummary {
        lines,
        malformed,
        stats: bus.stats(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("lines       {}", summary.lines);
        println!("malformed   {}", summary.malformed);
        println!("published   {}", summary.stats.published);
        println!("suppressed  {}", summary.stats.suppressed);
    }
    Ok(summary)
}

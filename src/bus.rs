//! In-process notification bus.
//!
//! Producers publish events on string topics; every subscriber of that topic
//! is called synchronously, in registration order, on the publisher's
//! thread. Logically identical events seen within the dedup window are
//! suppressed (see [`dedup`]).
//!
//! The bus is a plain value: construct one at startup and share it with an
//! `Arc`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mork_coord::bus::{into_payload, NotificationBus};
//! use mork_coord::config::BusConfig;
//! use serde_json::json;
//!
//! let bus = Arc::new(NotificationBus::new(&BusConfig::default()));
//! bus.subscribe("scan.new", |event| {
//!     println!("new token on {}", event.topic);
//!     Ok(())
//! });
//!
//! let payload = into_payload(json!({"mint": "ABC", "source": "x", "ts": 1000}));
//! assert_eq!(bus.publish("scan.new", payload.clone()), 1);
//! assert_eq!(bus.publish("scan.new", payload), 0);
//! ```

pub mod clock;
pub mod dedup;
pub mod event;
pub mod legacy;
pub mod subscriber;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dedup::{DedupCache, DedupKey};
pub use event::{into_payload, topics, Event, Payload};
pub use legacy::LegacyReceiver;
pub use subscriber::{LogSubscriber, NullSubscriber, Subscriber};

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::BusConfig;
use subscriber::FnSubscriber;

/// Snapshot of bus activity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BusStats {
    /// Publishes that passed deduplication.
    pub published: u64,
    /// Publishes suppressed as duplicates.
    pub suppressed: u64,
    /// Subscriber calls that returned `Ok`.
    pub delivered: u64,
    /// Subscriber calls that returned an error or panicked.
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    published: AtomicU64,
    suppressed: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// State guarded by the bus lock.
struct BusState {
    subscribers: HashMap<String, Vec<Arc<dyn Subscriber>>>,
    seen: DedupCache,
}

/// Publish/subscribe hub with content-based deduplication.
pub struct NotificationBus {
    state: Mutex<BusState>,
    window_secs: u64,
    legacy_capacity: usize,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl NotificationBus {
    /// Create a bus using the system clock.
    #[must_use]
    pub fn new(config: &BusConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a bus with an explicit time source for events without `ts`.
    #[must_use]
    pub fn with_clock(config: &BusConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(BusState {
                subscribers: HashMap::new(),
                seen: DedupCache::new(config.cache_size),
            }),
            window_secs: config.dedup_window_secs.max(1),
            legacy_capacity: config.legacy_queue_capacity.max(1),
            clock,
            counters: Counters::default(),
        }
    }

    /// Register a closure for `topic`.
    ///
    /// Only events published after this call are delivered.
    pub fn subscribe<F>(&self, topic: &str, callback: F)
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe_handler(topic, Arc::new(FnSubscriber(callback)));
    }

    /// Register a [`Subscriber`] implementation for `topic`.
    pub fn subscribe_handler(&self, topic: &str, subscriber: Arc<dyn Subscriber>) {
        self.state
            .lock()
            .subscribers
            .entry(topic.to_string())
            .or_default()
            .push(subscriber);
        debug!(topic = %topic, "Subscriber registered");
    }

    /// Subscribe a bounded queue to the legacy topics
    /// ([`topics::LEGACY`]).
    ///
    /// Events that do not fit in the queue are dropped for this receiver.
    #[must_use]
    pub fn subscribe_legacy(&self) -> LegacyReceiver {
        let (forwarder, receiver) = legacy::queue(self.legacy_capacity);
        let forwarder: Arc<dyn Subscriber> = forwarder;
        {
            let mut state = self.state.lock();
            for topic in topics::LEGACY {
                state
                    .subscribers
                    .entry(topic.to_string())
                    .or_default()
                    .push(Arc::clone(&forwarder));
            }
        }
        debug!(topics = ?topics::LEGACY, "Legacy queue subscribed");
        receiver
    }

    /// Publish `payload` on `topic`.
    ///
    /// Returns the number of subscribers invoked, or 0 when the event is a
    /// duplicate of one seen in the current dedup window. Subscriber
    /// failures are logged and counted but never returned.
    pub fn publish(&self, topic: &str, payload: Payload) -> usize {
        let key = DedupKey::derive(topic, &payload, self.window_secs, self.clock.as_ref());

        let subscribers = {
            let mut state = self.state.lock();
            if !state.seen.insert(key) {
                drop(state);
                self.counters.suppressed.fetch_add(1, Ordering::Relaxed);
                debug!(topic = %topic, "Duplicate event suppressed");
                return 0;
            }
            state.subscribers.get(topic).cloned().unwrap_or_default()
        };
        self.counters.published.fetch_add(1, Ordering::Relaxed);

        if subscribers.is_empty() {
            return 0;
        }

        let event = Event::new(topic, payload);
        for subscriber in &subscribers {
            self.dispatch(subscriber.as_ref(), &event);
        }
        subscribers.len()
    }

    fn dispatch(&self, subscriber: &dyn Subscriber, event: &Event) {
        match panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_event(event))) {
            Ok(Ok(())) => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(error)) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(topic = %event.topic, error = %error, "Subscriber failed");
            }
            Err(panic) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    topic = %event.topic,
                    panic = %panic_message(panic.as_ref()),
                    "Subscriber panicked"
                );
            }
        }
    }

    /// Number of subscribers registered for `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.state.lock().subscribers.get(topic).map_or(0, Vec::len)
    }

    /// Number of registrations across all topics. A legacy queue counts
    /// once per legacy topic.
    #[must_use]
    pub fn total_subscribers(&self) -> usize {
        self.state.lock().subscribers.values().map(Vec::len).sum()
    }

    /// Number of keys currently held in the dedup cache.
    #[must_use]
    pub fn dedup_len(&self) -> usize {
        self.state.lock().seen.len()
    }

    #[must_use]
    pub fn stats(&self) -> BusStats {
        BusStats {
            published: self.counters.published.load(Ordering::Relaxed),
            suppressed: self.counters.suppressed.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(&BusConfig::default())
    }
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBus")
            .field("window_secs", &self.window_secs)
            .field("legacy_capacity", &self.legacy_capacity)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

//! Queue-style consumption for older listeners.
//!
//! A legacy receiver is a bounded channel fed by an ordinary subscriber that
//! enqueues without blocking. When the queue is full the event is dropped
//! for that receiver only.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::trace;

use super::event::Event;
use super::subscriber::Subscriber;

/// Receiving end of a legacy queue subscription.
#[derive(Debug)]
pub struct LegacyReceiver {
    rx: mpsc::Receiver<Event>,
    dropped: Arc<AtomicU64>,
}

impl LegacyReceiver {
    /// Wait for the next event. Returns `None` once the bus is dropped and
    /// the queue is drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Take the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Block the current thread until the next event arrives.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context.
    pub fn blocking_recv(&mut self) -> Option<Event> {
        self.rx.blocking_recv()
    }

    /// Events dropped because this queue was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Subscriber that forwards into a legacy queue.
#[derive(Debug)]
pub(super) struct QueueForwarder {
    tx: mpsc::Sender<Event>,
    dropped: Arc<AtomicU64>,
}

impl Subscriber for QueueForwarder {
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        match self.tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(topic = %event.topic, "Legacy queue full, event dropped");
            }
            Err(TrySendError::Closed(_)) => {}
        }
        Ok(())
    }
}

/// Create a forwarder and its receiver. Capacity is at least one.
pub(super) fn queue(capacity: usize) -> (Arc<QueueForwarder>, LegacyReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    let forwarder = Arc::new(QueueForwarder {
        tx,
        dropped: Arc::clone(&dropped),
    });
    (forwarder, LegacyReceiver { rx, dropped })
}

//! Subscriber trait and the built-in subscribers.

use tracing::info;

use super::event::Event;

/// Receiver of bus events.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `on_event` runs on the publisher's thread and delays the rest of that
///   publish, so it should return quickly
/// - Errors and panics are logged by the bus and never reach the publisher
pub trait Subscriber: Send + Sync {
    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Any error is reported by the bus and otherwise ignored.
    fn on_event(&self, event: &Event) -> anyhow::Result<()>;
}

/// Adapter turning a closure into a [`Subscriber`].
pub(super) struct FnSubscriber<F>(pub(super) F);

impl<F> Subscriber for FnSubscriber<F>
where
    F: Fn(&Event) -> anyhow::Result<()> + Send + Sync,
{
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        (self.0)(event)
    }
}

/// A no-op subscriber for testing or when a consumer is disabled.
pub struct NullSubscriber;

impl Subscriber for NullSubscriber {
    fn on_event(&self, _event: &Event) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A subscriber that logs events via tracing.
pub struct LogSubscriber;

impl Subscriber for LogSubscriber {
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        let mint = event
            .str_field("mint")
            .or_else(|| event.str_field("address"))
            .unwrap_or("-");
        let source = event.str_field("source").unwrap_or("-");
        info!(
            topic = %event.topic,
            mint = %mint,
            source = %source,
            fields = event.payload.len(),
            "Event published"
        );
        Ok(())
    }
}

//! Event and payload types carried by the bus.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open key/value payload of an event.
pub type Payload = Map<String, Value>;

/// Well-known topic names.
pub mod topics {
    /// A scanner found a new token.
    pub const SCAN_NEW: &str = "scan.new";
    /// An inbound webhook update was received.
    pub const WEBHOOK_UPDATE: &str = "webhook.update";
    /// Application lifecycle events. This is a literal topic name, not a
    /// pattern.
    pub const APP_ALL: &str = "app.*";

    /// Topics forwarded to legacy queue receivers.
    pub const LEGACY: [&str; 3] = [SCAN_NEW, WEBHOOK_UPDATE, APP_ALL];
}

/// A published event as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub topic: String,
    pub payload: Payload,
}

impl Event {
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: Payload) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Payload field by name.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Payload field as a string slice, if it is a JSON string.
    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// Convert an arbitrary JSON value into a payload.
///
/// Objects are used as-is; any other value is wrapped as `{"data": value}`.
#[must_use]
pub fn into_payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    }
}

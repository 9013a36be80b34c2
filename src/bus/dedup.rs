//! Content-based deduplication of published events.
//!
//! Two events collapse to the same [`DedupKey`] when they share a topic, the
//! same token identifier (`mint`, falling back to `address`, compared
//! case-insensitively), the same `source` (case-insensitive) and the same
//! time bucket. This absorbs bursty re-detection of one token by several
//! scanners.

use std::collections::{HashSet, VecDeque};

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::clock::Clock;
use super::event::Payload;

/// Hex-encoded SHA-256 digest identifying a logical event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    /// Derive the key for `payload` published on `topic`.
    ///
    /// The bucket is `ts / window_secs` (floor division) where `ts` is the
    /// payload's timestamp in seconds. A missing, null, zero or unparseable
    /// `ts` is replaced by `clock`'s current time.
    pub fn derive(topic: &str, payload: &Payload, window_secs: u64, clock: &dyn Clock) -> Self {
        let identifier = truthy_text(payload.get("mint"))
            .or_else(|| truthy_text(payload.get("address")))
            .unwrap_or_default()
            .to_lowercase();
        let source = plain_text(payload.get("source")).to_lowercase();
        let ts = timestamp_secs(payload.get("ts")).unwrap_or_else(|| clock.now_secs());
        let window = i64::try_from(window_secs).unwrap_or(i64::MAX).max(1);
        let bucket = ts.div_euclid(window);

        Self::from_material(&format!("{topic}:{identifier}:{source}:{bucket}"))
    }

    fn from_material(material: &str) -> Self {
        Self(hex::encode(Sha256::digest(material.as_bytes())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Text of a field that counts as present: not null, `false`, zero or an
/// empty string/array/object.
fn truthy_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        other => Some(other.to_string()),
    }
}

fn plain_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn timestamp_secs(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some(1),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                // saturating cast, truncates toward zero
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Bounded, insertion-ordered set of recently seen keys.
///
/// Holds at most `capacity` keys. Inserting a new key into a full cache
/// evicts the oldest one; re-inserting a present key changes nothing.
#[derive(Debug)]
pub struct DedupCache {
    order: VecDeque<DedupKey>,
    members: HashSet<DedupKey>,
    capacity: usize,
}

impl DedupCache {
    /// Create a cache; a zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            order: VecDeque::with_capacity(capacity.min(4096)),
            members: HashSet::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    #[must_use]
    pub fn contains(&self, key: &DedupKey) -> bool {
        self.members.contains(key)
    }

    /// Record `key`. Returns `false` if it was already present.
    pub fn insert(&mut self, key: DedupKey) -> bool {
        if self.members.contains(&key) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.members.insert(key.clone());
        self.order.push_back(key);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

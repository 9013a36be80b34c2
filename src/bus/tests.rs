use super::*;
use serde_json::{json, Value};
use std::sync::atomic::AtomicUsize;

fn payload(value: Value) -> Payload {
    into_payload(value)
}

fn bus_at(now: i64) -> (NotificationBus, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now));
    let bus = NotificationBus::with_clock(&BusConfig::default(), clock.clone());
    (bus, clock)
}

struct CountingSubscriber {
    count: Arc<AtomicUsize>,
}

impl Subscriber for CountingSubscriber {
    fn on_event(&self, _event: &Event) -> anyhow::Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_publish_without_subscribers_returns_zero() {
    let (bus, _) = bus_at(0);
    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "A"}))), 0);
    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "A"}))), 0);
    assert_eq!(bus.stats().published, 1);
    assert_eq!(bus.stats().suppressed, 1);
}

#[test]
fn test_duplicate_within_bucket_is_suppressed() {
    let (bus, _) = bus_at(0);
    let count = Arc::new(AtomicUsize::new(0));
    bus.subscribe_handler(
        "scan.new",
        Arc::new(CountingSubscriber {
            count: count.clone(),
        }),
    );

    let first = bus.publish(
        "scan.new",
        payload(json!({"mint": "ABC", "source": "x", "ts": 1000})),
    );
    let second = bus.publish(
        "scan.new",
        payload(json!({"mint": "abc", "source": "X", "ts": 1005})),
    );

    assert_eq!(first, 1);
    assert_eq!(second, 0);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_new_bucket_is_delivered() {
    let (bus, _) = bus_at(0);
    bus.subscribe("scan.new", |_| Ok(()));

    assert_eq!(
        bus.publish("scan.new", payload(json!({"mint": "ABC", "source": "x", "ts": 1000}))),
        1
    );
    assert_eq!(
        bus.publish("scan.new", payload(json!({"mint": "ABC", "source": "x", "ts": 1301}))),
        1
    );
    assert_eq!(
        bus.publish("scan.new", payload(json!({"mint": "abc", "source": "X", "ts": 1301}))),
        0
    );
}

#[test]
fn test_subscribers_run_in_registration_order() {
    let (bus, _) = bus_at(0);
    let seen = Arc::new(Mutex::new(Vec::new()));

    for id in 0..3 {
        let seen = seen.clone();
        bus.subscribe("webhook.update", move |_| {
            seen.lock().push(id);
            Ok(())
        });
    }

    assert_eq!(bus.publish("webhook.update", payload(json!({"ts": 5}))), 3);
    assert_eq!(*seen.lock(), vec![0, 1, 2]);
}

#[test]
fn test_failing_subscriber_is_isolated() {
    let (bus, _) = bus_at(0);
    let count = Arc::new(AtomicUsize::new(0));

    let before = count.clone();
    bus.subscribe("scan.new", move |_| {
        before.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    bus.subscribe("scan.new", |_| Err(anyhow::anyhow!("admin chat unreachable")));
    let after = count.clone();
    bus.subscribe("scan.new", move |_| {
        after.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let delivered = bus.publish("scan.new", payload(json!({"mint": "Z", "ts": 42})));

    assert_eq!(delivered, 3);
    assert_eq!(count.load(Ordering::SeqCst), 2);
    let stats = bus.stats();
    assert_eq!(stats.delivered, 2);
    assert_eq!(stats.failed, 1);

    // the failure does not un-record the key
    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "Z", "ts": 42}))), 0);
}

#[test]
fn test_panicking_subscriber_is_isolated() {
    let (bus, _) = bus_at(0);
    let count = Arc::new(AtomicUsize::new(0));

    bus.subscribe("scan.new", |_| panic!("boom"));
    let counter = count.clone();
    bus.subscribe("scan.new", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "P", "ts": 1}))), 2);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(bus.stats().failed, 1);
}

#[test]
fn test_subscribe_only_sees_future_events() {
    let (bus, _) = bus_at(0);
    bus.publish("scan.new", payload(json!({"mint": "EARLY", "ts": 1})));

    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    bus.subscribe("scan.new", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    assert_eq!(count.load(Ordering::SeqCst), 0);
    bus.publish("scan.new", payload(json!({"mint": "LATE", "ts": 1})));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_callback_may_publish_and_subscribe_reentrantly() {
    let (bus, _) = bus_at(0);
    let bus = Arc::new(bus);
    let count = Arc::new(AtomicUsize::new(0));

    let inner_bus = Arc::clone(&bus);
    let inner_count = count.clone();
    bus.subscribe("scan.new", move |event| {
        let counter = inner_count.clone();
        inner_bus.subscribe("trade.queued", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        inner_bus.publish("trade.queued", event.payload.clone());
        Ok(())
    });

    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "R", "ts": 9}))), 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(bus.subscriber_count("trade.queued"), 1);
}

#[test]
fn test_missing_ts_uses_clock_bucket() {
    let (bus, clock) = bus_at(1000);
    bus.subscribe("scan.new", |_| Ok(()));

    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "T"}))), 1);

    clock.advance(199);
    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "T"}))), 0);

    clock.advance(1);
    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "T"}))), 1);
}

#[test]
fn test_dedup_history_is_bounded() {
    let config = BusConfig {
        cache_size: 3,
        ..BusConfig::default()
    };
    let bus = NotificationBus::with_clock(&config, Arc::new(ManualClock::new(0)));
    bus.subscribe("scan.new", |_| Ok(()));

    for mint in ["a", "b", "c", "d"] {
        assert_eq!(bus.publish("scan.new", payload(json!({"mint": mint, "ts": 1}))), 1);
    }
    assert_eq!(bus.dedup_len(), 3);

    // "a" was evicted, "d" is still remembered
    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "d", "ts": 1}))), 0);
    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "a", "ts": 1}))), 1);
}

#[test]
fn test_legacy_receiver_gets_legacy_topics_only() {
    let (bus, _) = bus_at(0);
    let mut receiver = bus.subscribe_legacy();

    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "L", "ts": 1}))), 1);
    assert_eq!(bus.publish("webhook.update", payload(json!({"ts": 2}))), 1);
    assert_eq!(bus.publish("app.*", payload(json!({"ts": 3}))), 1);
    assert_eq!(bus.publish("dm.alert.sent", payload(json!({"ts": 4}))), 0);

    let topics: Vec<String> = std::iter::from_fn(|| receiver.try_recv())
        .map(|e| e.topic)
        .collect();
    assert_eq!(topics, vec!["scan.new", "webhook.update", "app.*"]);
}

#[test]
fn test_legacy_overflow_drops_but_counts_delivery() {
    let config = BusConfig {
        legacy_queue_capacity: 1,
        ..BusConfig::default()
    };
    let bus = NotificationBus::with_clock(&config, Arc::new(ManualClock::new(0)));
    let mut receiver = bus.subscribe_legacy();

    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "1", "ts": 1}))), 1);
    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "2", "ts": 1}))), 1);

    assert_eq!(receiver.dropped(), 1);
    assert_eq!(
        receiver.try_recv().and_then(|e| e.str_field("mint").map(String::from)),
        Some("1".to_string())
    );
    assert!(receiver.try_recv().is_none());
}

#[test]
fn test_legacy_and_callbacks_coexist() {
    let (bus, _) = bus_at(0);
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    bus.subscribe("scan.new", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let mut receiver = bus.subscribe_legacy();

    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "C", "ts": 1}))), 2);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(receiver.try_recv().is_some());
    assert_eq!(bus.subscriber_count("scan.new"), 2);
    assert_eq!(bus.total_subscribers(), 4);
}

#[test]
fn test_null_and_log_subscribers_accept_events() {
    let (bus, _) = bus_at(0);
    bus.subscribe_handler("scan.new", Arc::new(NullSubscriber));
    bus.subscribe_handler("scan.new", Arc::new(LogSubscriber));

    assert_eq!(bus.publish("scan.new", payload(json!({"mint": "N", "ts": 1}))), 2);
    assert_eq!(bus.stats().failed, 0);
}

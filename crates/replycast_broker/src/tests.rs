use std::sync::Arc;

use replycast_config::BrokerSettings;
use serde_json::json;

use super::{Broker, BrokerError, Event, Subscriber};
use crate::topic::Topic;

fn broker() -> Arc<Broker> {
    Arc::new(Broker::default())
}

fn webhook(event_type: &str) -> Event {
    Event::webhook(Some(event_type.to_string()), json!({ "threadId": "abc" }))
}

#[test]
fn test_topic_new() {
    let topic = Topic::new("test_topic");
    assert_eq!(topic.name, "test_topic");
    assert!(topic.is_empty());
}

#[test]
fn test_topic_subscribe_is_set_semantics() {
    let mut topic = Topic::new("test_topic");
    let (subscriber, _rx) = Subscriber::new(4);
    assert!(topic.subscribe(subscriber.clone()));
    assert!(!topic.subscribe(subscriber.clone()));
    assert_eq!(topic.len(), 1);
    assert!(topic.unsubscribe(&subscriber.id));
    assert!(!topic.unsubscribe(&subscriber.id));
}

#[test]
fn test_subscribe_and_unsubscribe_restore_count() {
    let broker = broker();
    let (subscriber, _rx) = broker.new_subscriber();

    assert_eq!(broker.subscriber_count("abc"), 0);
    let subscription = broker.subscribe("abc", subscriber).unwrap();
    assert_eq!(broker.subscriber_count("abc"), 1);

    assert!(subscription.unsubscribe());
    assert_eq!(broker.subscriber_count("abc"), 0);
    assert_eq!(broker.topic_count(), 0);
}

#[test]
fn test_unsubscribe_twice_is_noop() {
    let broker = broker();
    let (s1, _rx1) = broker.new_subscriber();
    let (s2, _rx2) = broker.new_subscriber();
    let first = broker.subscribe("abc", s1).unwrap();
    let _second = broker.subscribe("abc", s2).unwrap();
    assert_eq!(broker.subscriber_count("abc"), 2);

    assert!(first.unsubscribe());
    assert!(!first.unsubscribe());
    assert!(!first.is_active());
    assert_eq!(broker.subscriber_count("abc"), 1);
}

#[test]
fn test_duplicate_subscribe_does_not_duplicate_delivery() {
    let broker = broker();
    let (subscriber, mut rx) = broker.new_subscriber();
    let _a = broker.subscribe("abc", subscriber.clone()).unwrap();
    let b = broker.subscribe("abc", subscriber).unwrap();
    assert_eq!(broker.subscriber_count("abc"), 1);

    assert_eq!(broker.publish("abc", webhook("thread.message_sent")), 1);
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());

    b.detach();
    assert_eq!(broker.subscriber_count("abc"), 1);
}

#[test]
fn test_subscribe_rejects_empty_topic() {
    let broker = broker();
    let (subscriber, _rx) = broker.new_subscriber();
    let err = broker.subscribe("", subscriber).unwrap_err();
    assert_eq!(err, BrokerError::EmptyTopic);
    assert_eq!(broker.topic_count(), 0);
}

#[test]
fn test_drop_releases_subscription() {
    let broker = broker();
    let (subscriber, _rx) = broker.new_subscriber();
    {
        let _subscription = broker.subscribe("abc", subscriber).unwrap();
        assert_eq!(broker.subscriber_count("abc"), 1);
    }
    assert_eq!(broker.subscriber_count("abc"), 0);
}

#[test]
fn test_subscription_outliving_broker_is_harmless() {
    let broker = broker();
    let (subscriber, _rx) = broker.new_subscriber();
    let subscription = broker.subscribe("abc", subscriber).unwrap();
    drop(broker);
    assert!(!subscription.unsubscribe());
}

#[test]
fn test_publish_to_nonexistent_topic() {
    let broker = broker();
    assert_eq!(broker.publish("nobody", webhook("thread.created")), 0);
    assert_eq!(broker.stats().published, 1);
    assert_eq!(broker.stats().delivered, 0);
}

#[test]
fn test_publish_preserves_order_per_subscriber() {
    let broker = broker();
    let (s1, mut rx1) = broker.new_subscriber();
    let (s2, mut rx2) = broker.new_subscriber();
    let _g1 = broker.subscribe("abc", s1).unwrap();
    let _g2 = broker.subscribe("abc", s2).unwrap();

    let e1 = webhook("thread.created");
    let e2 = webhook("thread.message_sent");
    assert_eq!(broker.publish("abc", e1.clone()), 2);
    assert_eq!(broker.publish("abc", e2.clone()), 2);

    for rx in [&mut rx1, &mut rx2] {
        assert_eq!(rx.try_recv().unwrap(), e1);
        assert_eq!(rx.try_recv().unwrap(), e2);
    }
}

#[test]
fn test_publish_is_scoped_to_topic() {
    let broker = broker();
    let (s1, mut rx1) = broker.new_subscriber();
    let _g = broker.subscribe("abc", s1).unwrap();

    broker.publish("other", webhook("thread.created"));
    assert!(rx1.try_recv().is_err());
}

#[test]
fn test_publish_to_client_with_closed_channel() {
    let broker = broker();
    let (s1, rx1) = broker.new_subscriber();
    let (s2, mut rx2) = broker.new_subscriber();
    let _g1 = broker.subscribe("abc", s1).unwrap();
    let _g2 = broker.subscribe("abc", s2).unwrap();

    drop(rx1);

    let event = webhook("thread.message_sent");
    assert_eq!(broker.publish("abc", event.clone()), 1);
    assert_eq!(rx2.try_recv().unwrap(), event);

    // No eviction by default.
    assert_eq!(broker.subscriber_count("abc"), 2);
    let stats = broker.stats();
    assert_eq!(stats.delivery_faults, 1);
    assert_eq!(stats.evicted, 0);
}

#[test]
fn test_full_queue_does_not_block_publish() {
    let broker = Arc::new(Broker::new(BrokerSettings {
        subscriber_buffer: 1,
        ..BrokerSettings::default()
    }));
    let (slow, mut slow_rx) = broker.new_subscriber();
    let (fast, mut fast_rx) = broker.new_subscriber();
    let _g1 = broker.subscribe("abc", slow).unwrap();
    let _g2 = broker.subscribe("abc", fast).unwrap();

    let e1 = webhook("thread.created");
    let e2 = webhook("thread.message_sent");
    assert_eq!(broker.publish("abc", e1.clone()), 2);
    assert_eq!(fast_rx.try_recv().unwrap(), e1);

    // The slow subscriber still holds e1, so e2 only reaches the fast one.
    assert_eq!(broker.publish("abc", e2.clone()), 1);
    assert_eq!(fast_rx.try_recv().unwrap(), e2);
    assert_eq!(slow_rx.try_recv().unwrap(), e1);
    assert!(slow_rx.try_recv().is_err());
}

#[test]
fn test_eviction_after_repeated_faults() {
    let broker = Arc::new(Broker::new(BrokerSettings {
        max_delivery_failures: 2,
        ..BrokerSettings::default()
    }));
    let (dead, dead_rx) = broker.new_subscriber();
    let (live, mut live_rx) = broker.new_subscriber();
    let dead_id = dead.id.clone();
    let _g1 = broker.subscribe("abc", dead).unwrap();
    let _g2 = broker.subscribe("abc", live).unwrap();
    drop(dead_rx);

    broker.publish("abc", webhook("a"));
    assert!(broker.is_subscribed("abc", &dead_id));
    broker.publish("abc", webhook("b"));
    assert!(!broker.is_subscribed("abc", &dead_id));

    assert_eq!(broker.subscriber_count("abc"), 1);
    assert_eq!(broker.stats().evicted, 1);
    assert!(live_rx.try_recv().is_ok());
    assert!(live_rx.try_recv().is_ok());
}

#[test]
fn test_unsubscribe_during_delivery_loop() {
    let broker = broker();
    let (subscriber, mut rx) = broker.new_subscriber();
    let subscription = broker.subscribe("abc", subscriber).unwrap();

    broker.publish("abc", webhook("a"));
    subscription.unsubscribe();
    broker.publish("abc", webhook("b"));

    assert!(matches!(rx.try_recv(), Ok(Event::Webhook { .. })));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_concurrent_subscribe_publish_unsubscribe() {
    let broker = broker();
    let mut handles = Vec::new();

    for _ in 0..16 {
        let broker = broker.clone();
        handles.push(tokio::spawn(async move {
            let (subscriber, mut rx) = broker.new_subscriber();
            let subscription = broker.subscribe("busy", subscriber).unwrap();
            broker.publish("busy", webhook("thread.message_sent"));
            tokio::task::yield_now().await;
            assert!(rx.recv().await.is_some());
            subscription.unsubscribe();
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(broker.subscriber_count("busy"), 0);
    assert_eq!(broker.topic_count(), 0);
}

#[test]
fn test_event_wire_shape() {
    let connected = Event::connected("abc").to_json().unwrap();
    assert_eq!(connected, r#"{"type":"connected","threadId":"abc"}"#);

    let decoded: Event =
        serde_json::from_str(r#"{"type":"webhook","eventType":"thread.message_sent"}"#).unwrap();
    match decoded {
        Event::Webhook {
            event_type,
            payload,
            ..
        } => {
            assert_eq!(event_type.as_deref(), Some("thread.message_sent"));
            assert!(payload.is_null());
        }
        other => panic!("expected webhook, got {other:?}"),
    }

    let unknown: Event = serde_json::from_str(r#"{"type":"typing","who":"agent"}"#).unwrap();
    assert_eq!(unknown, Event::Unknown);
    assert_eq!(unknown.kind(), "unknown");
}

//! Broker engine
//!
//! This module contains the in-memory registry responsible for:
//! - managing topics and their subscriber sets
//! - fanning published events out to every current subscriber
//! - counting delivery faults and, when configured, evicting subscribers
//!   that keep failing
//!
//! Concurrency and usage notes:
//! - The broker is shared as `Arc<Broker>`; every method takes `&self`.
//!   The registry lock is a plain `std::sync::Mutex` that is never held
//!   across an `.await` or a delivery.
//! - `publish` snapshots the subscriber set under the lock and then
//!   delivers with `try_send` outside of it, so a subscriber removing
//!   itself mid-delivery cannot invalidate the iteration and a slow
//!   subscriber cannot stall the producer.
//! - Per-subscriber order follows publish order because each subscriber
//!   is a FIFO queue. There is no ordering across topics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use replycast_config::BrokerSettings;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::BrokerError;
use crate::message::Event;
use crate::subscriber::{Subscriber, SubscriberId};
use crate::subscription::Subscription;
use crate::topic::Topic;

/// Point-in-time counters, reported on the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BrokerStats {
    pub topics: usize,
    pub subscribers: usize,
    pub published: u64,
    pub delivered: u64,
    pub delivery_faults: u64,
    pub evicted: u64,
}

#[derive(Debug)]
pub struct Broker {
    topics: Mutex<HashMap<String, Topic>>,
    settings: BrokerSettings,
    published: AtomicU64,
    delivered: AtomicU64,
    delivery_faults: AtomicU64,
    evicted: AtomicU64,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(BrokerSettings::default())
    }
}

impl Broker {
    pub fn new(settings: BrokerSettings) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            settings,
            published: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            delivery_faults: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        }
    }

    /// Create a subscriber sized by `broker.subscriber_buffer`.
    pub fn new_subscriber(&self) -> (Subscriber, tokio::sync::mpsc::Receiver<Event>) {
        Subscriber::new(self.settings.subscriber_buffer)
    }

    // A panic while holding the lock cannot leave the map half-updated, so
    // a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Topic>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `subscriber` under `topic`.
    ///
    /// Subscribing an already-registered subscriber does not duplicate
    /// delivery. The returned handle removes exactly this subscriber from
    /// exactly this topic. Handles obtained for the same subscriber twice
    /// share that removal: whichever is released first removes it.
    pub fn subscribe(
        self: &Arc<Self>,
        topic: &str,
        subscriber: Subscriber,
    ) -> Result<Subscription, BrokerError> {
        if topic.is_empty() {
            return Err(BrokerError::EmptyTopic);
        }

        let subscriber_id = subscriber.id.clone();
        let added = self
            .lock()
            .entry(topic.to_string())
            .or_insert_with(|| Topic::new(topic))
            .subscribe(subscriber);

        if added {
            debug!(topic = %topic, subscriber = %subscriber_id, "subscribed");
        } else {
            debug!(topic = %topic, subscriber = %subscriber_id, "already subscribed");
        }

        Ok(Subscription::new(
            Arc::downgrade(self),
            topic.to_string(),
            subscriber_id,
        ))
    }

    /// Remove a subscriber from a topic. Returns `true` if it was present.
    /// Topics are dropped from the registry once their last subscriber leaves.
    pub fn unsubscribe(&self, topic: &str, subscriber: &SubscriberId) -> bool {
        let mut topics = self.lock();
        let Some(t) = topics.get_mut(topic) else {
            return false;
        };
        let removed = t.unsubscribe(subscriber);
        if t.is_empty() {
            topics.remove(topic);
        }
        if removed {
            debug!(topic = %topic, subscriber = %subscriber, "unsubscribed");
        }
        removed
    }

    /// Deliver `event` to every subscriber currently registered under
    /// `topic` and return how many accepted it.
    ///
    /// Publishing to a topic nobody listens on is a no-op. A fault for one
    /// subscriber is logged and never stops delivery to the rest.
    pub fn publish(&self, topic: &str, event: Event) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);

        let targets = match self.lock().get(topic) {
            Some(t) => t.snapshot(),
            None => {
                debug!(topic = %topic, "no subscribers; event dropped");
                return 0;
            }
        };

        let mut succeeded = Vec::with_capacity(targets.len());
        let mut faulted = Vec::new();

        for subscriber in &targets {
            match subscriber.try_deliver(event.clone()) {
                Ok(()) => succeeded.push(subscriber.id.clone()),
                Err(e) => {
                    warn!(
                        topic = %topic,
                        subscriber = %subscriber.id,
                        error = %e,
                        "delivery failed"
                    );
                    faulted.push(subscriber.id.clone());
                }
            }
        }

        self.delivered
            .fetch_add(succeeded.len() as u64, Ordering::Relaxed);
        self.delivery_faults
            .fetch_add(faulted.len() as u64, Ordering::Relaxed);

        if self.settings.max_delivery_failures > 0 {
            self.track_faults(topic, &succeeded, &faulted);
        }

        succeeded.len()
    }

    fn track_faults(&self, topic: &str, succeeded: &[SubscriberId], faulted: &[SubscriberId]) {
        let limit = self.settings.max_delivery_failures;
        let mut topics = self.lock();
        let Some(t) = topics.get_mut(topic) else {
            return;
        };

        for id in succeeded {
            t.record_success(id);
        }
        for id in faulted {
            if t.record_fault(id).is_some_and(|n| n >= limit) {
                t.unsubscribe(id);
                self.evicted.fetch_add(1, Ordering::Relaxed);
                info!(
                    topic = %topic,
                    subscriber = %id,
                    faults = limit,
                    "evicted subscriber after repeated delivery faults"
                );
            }
        }

        if t.is_empty() {
            topics.remove(topic);
        }
    }

    /// Number of subscribers under `topic`; `0` for unknown or drained topics.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock().get(topic).map_or(0, Topic::len)
    }

    pub fn is_subscribed(&self, topic: &str, subscriber: &SubscriberId) -> bool {
        self.lock()
            .get(topic)
            .is_some_and(|t| t.contains(subscriber))
    }

    pub fn topic_count(&self) -> usize {
        self.lock().len()
    }

    pub fn stats(&self) -> BrokerStats {
        let (topics, subscribers) = {
            let topics = self.lock();
            (topics.len(), topics.values().map(Topic::len).sum())
        };
        BrokerStats {
            topics,
            subscribers,
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            delivery_faults: self.delivery_faults.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }
}

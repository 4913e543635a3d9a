//! Topic management
//!
//! A `Topic` holds the subscriber set for one topic key. Subscribers are
//! keyed by id, so subscribing the same subscriber twice is a no-op. Each
//! entry also tracks consecutive delivery faults for optional eviction.
//!
//! Concurrency note: callers must synchronize access to `Topic` (the broker
//! keeps every topic behind its registry lock).

use std::collections::HashMap;

use crate::subscriber::{Subscriber, SubscriberId};

#[derive(Debug)]
struct Entry {
    subscriber: Subscriber,
    consecutive_faults: u32,
}

#[derive(Debug, Default)]
pub struct Topic {
    pub name: String,
    subscribers: HashMap<SubscriberId, Entry>,
}

impl Topic {
    /// Create a new topic with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: HashMap::new(),
        }
    }

    /// Add a subscriber. Returns `false` if it was already present.
    pub fn subscribe(&mut self, subscriber: Subscriber) -> bool {
        if self.subscribers.contains_key(&subscriber.id) {
            return false;
        }
        self.subscribers.insert(
            subscriber.id.clone(),
            Entry {
                subscriber,
                consecutive_faults: 0,
            },
        );
        true
    }

    /// Remove a subscriber. Returns `true` if it was present.
    pub fn unsubscribe(&mut self, id: &SubscriberId) -> bool {
        self.subscribers.remove(id).is_some()
    }

    pub fn contains(&self, id: &SubscriberId) -> bool {
        self.subscribers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Clone out the current subscribers so delivery can happen without
    /// holding the registry lock.
    pub fn snapshot(&self) -> Vec<Subscriber> {
        self.subscribers
            .values()
            .map(|entry| entry.subscriber.clone())
            .collect()
    }

    pub(crate) fn record_success(&mut self, id: &SubscriberId) {
        if let Some(entry) = self.subscribers.get_mut(id) {
            entry.consecutive_faults = 0;
        }
    }

    /// Bump the fault counter and return the new value, or `None` if the
    /// subscriber left in the meantime.
    pub(crate) fn record_fault(&mut self, id: &SubscriberId) -> Option<u32> {
        self.subscribers.get_mut(id).map(|entry| {
            entry.consecutive_faults = entry.consecutive_faults.saturating_add(1);
            entry.consecutive_faults
        })
    }
}

//! Unsubscribe handle
//!
//! `Subscription` is the capability returned by `Broker::subscribe`. It
//! removes its subscriber at most once, whether through `unsubscribe` or on
//! drop, which makes it usable as a scoped guard: a session that owns one
//! releases its registry entry on every exit path.
//!
//! The handle holds a weak reference, so an outstanding subscription does
//! not keep a torn-down broker alive.

use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::Broker;
use crate::subscriber::SubscriberId;

#[derive(Debug)]
pub struct Subscription {
    broker: Weak<Broker>,
    topic: String,
    subscriber_id: SubscriberId,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(broker: Weak<Broker>, topic: String, subscriber_id: SubscriberId) -> Self {
        Self {
            broker,
            topic,
            subscriber_id,
            active: AtomicBool::new(true),
        }
    }

    pub fn subscriber_id(&self) -> &SubscriberId {
        &self.subscriber_id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Remove the subscriber from its topic. Only the first call has an
    /// effect; later calls return `false`.
    pub fn unsubscribe(&self) -> bool {
        if !self.active.swap(false, Ordering::SeqCst) {
            return false;
        }
        match self.broker.upgrade() {
            Some(broker) => broker.unsubscribe(&self.topic, &self.subscriber_id),
            None => false,
        }
    }

    /// Disarm the handle without unsubscribing. The subscriber stays
    /// registered until removed some other way.
    pub fn detach(self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

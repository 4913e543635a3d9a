//! Subscriber representation
//!
//! A `Subscriber` stands for one open delivery channel: a UUID identity and
//! the sending half of a bounded queue drained by the owning session. The
//! broker only ever pushes with `try_send`, so a slow consumer can fill its
//! own queue but can never stall a publisher.

use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use uuid::Uuid;

use crate::error::DeliveryError;
use crate::message::Event;

pub type SubscriberId = String;

#[derive(Debug, Clone)]
pub struct Subscriber {
    pub id: SubscriberId,
    sender: Sender<Event>,
}

impl Subscriber {
    /// Create a subscriber with a fresh id and a queue holding at most
    /// `capacity` undelivered events. Returns the receiving half alongside.
    pub fn new(capacity: usize) -> (Self, Receiver<Event>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::with_sender(sender), receiver)
    }

    pub fn with_sender(sender: Sender<Event>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
        }
    }

    /// Enqueue without waiting.
    pub fn try_deliver(&self, event: Event) -> Result<(), DeliveryError> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

//! replycast_broker
//!
//! In-memory topic registry that fans events out from webhook deliveries to
//! the streaming sessions held open by browsers.
//!
//! Public types:
//! - `Broker`: the registry itself. Subscribe, unsubscribe, publish, count.
//! - `Subscriber`: identity plus the sending half of a bounded per-session queue.
//! - `Subscription`: handle returned by `Broker::subscribe`; releases the
//!   subscriber when invoked or dropped.
//! - `Event`: the envelope every subscriber receives.
//!
//! State is process-local. Nothing survives a restart and nothing is shared
//! between instances of the service.

pub mod engine;
pub mod error;
pub mod message;
pub mod subscriber;
pub mod subscription;
pub mod topic;

pub use engine::{Broker, BrokerStats};
pub use error::{BrokerError, DeliveryError};
pub use message::Event;
pub use subscriber::{Subscriber, SubscriberId};
pub use subscription::Subscription;

#[cfg(test)]
mod tests;

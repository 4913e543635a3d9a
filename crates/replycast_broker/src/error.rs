use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("topic key must not be empty")]
    EmptyTopic,
}

/// Why a single subscriber did not receive an event.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The subscriber's queue is at capacity; the event was dropped for it.
    #[error("subscriber queue is full")]
    Full,
    /// The receiving side is gone.
    #[error("subscriber channel is closed")]
    Closed,
}

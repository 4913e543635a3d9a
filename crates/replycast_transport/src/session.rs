//! Streaming sessions
//!
//! A `Session` adapts one client-held streaming connection to one broker
//! subscription for the connection's whole lifetime:
//! - `open` validates the thread id and subscribes; nothing is allocated
//!   when the id is missing
//! - `run` writes the `connected` event, then forwards broker events and
//!   periodic heartbeats into the outbound channel until the client goes
//!   away or a write fails
//! - `close` (also run on drop) releases the subscription exactly once
//!
//! The outbound side is a bounded `mpsc` channel whose receiver is owned by
//! the HTTP response body. When the client disconnects the body is dropped,
//! the channel closes and the session tears itself down.
//!
//! `run` consumes the session, so its lifecycle is published on a `watch`
//! channel obtained from `watch_state` before the session is handed off.

use std::sync::Arc;
use std::time::Duration;

use replycast_broker::{Broker, Event, Subscription};
use replycast_config::{MAX_HEARTBEAT_INTERVAL_SECS, StreamSettings};
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use crate::error::SessionError;

/// One unit written to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(Event),
    /// Comment-only keepalive so idle proxies leave the connection open.
    Heartbeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Subscribed; the `connected` event has not been written yet.
    Opening,
    Connected,
    /// Subscription released. Terminal.
    Closed,
}

#[derive(Debug)]
pub struct Session {
    thread_id: String,
    subscription: Option<Subscription>,
    inbox: Receiver<Event>,
    heartbeat_period: Duration,
    state: watch::Sender<SessionState>,
}

impl Session {
    pub fn open(
        broker: &Arc<Broker>,
        thread_id: Option<&str>,
        settings: &StreamSettings,
    ) -> Result<Self, SessionError> {
        // Blank ids are rejected. The topic key is the id as sent, untrimmed.
        let thread_id = thread_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(SessionError::MissingThreadId)?;

        let (subscriber, inbox) = broker.new_subscriber();
        let subscription = broker.subscribe(thread_id, subscriber)?;

        debug!(thread_id = %thread_id, subscriber = %subscription.subscriber_id(), "session opened");

        Ok(Self {
            thread_id: thread_id.to_string(),
            subscription: Some(subscription),
            inbox,
            heartbeat_period: Duration::from_secs(
                settings
                    .heartbeat_interval_secs
                    .clamp(1, MAX_HEARTBEAT_INTERVAL_SECS),
            ),
            state: watch::Sender::new(SessionState::Opening),
        })
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Follow the lifecycle after `run` has taken ownership of the session.
    /// The receiver sees `Closed` last and then reports the sender gone.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn heartbeat_period(&self) -> Duration {
        self.heartbeat_period
    }

    /// Drive the session until the client disconnects or a write fails.
    pub async fn run(mut self, outbound: Sender<Frame>) {
        if outbound
            .send(Frame::Event(Event::connected(self.thread_id.clone())))
            .await
            .is_err()
        {
            self.close("client gone before connect");
            return;
        }
        self.state.send_replace(SessionState::Connected);
        info!(thread_id = %self.thread_id, "stream connected");

        let start = Instant::now() + self.heartbeat_period;
        let mut heartbeat = interval_at(start, self.heartbeat_period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                _ = outbound.closed() => break "client disconnected",
                event = self.inbox.recv() => match event {
                    Some(event) => {
                        if outbound.send(Frame::Event(event)).await.is_err() {
                            break "write failed";
                        }
                    }
                    None => break "subscription ended",
                },
                _ = heartbeat.tick() => {
                    if outbound.send(Frame::Heartbeat).await.is_err() {
                        break "heartbeat failed";
                    }
                }
            }
        };

        drop(heartbeat);
        self.close(reason);
    }

    /// Release the subscription and stop accepting events. Safe to call
    /// any number of times.
    pub fn close(&mut self, reason: &str) {
        if self.state() == SessionState::Closed {
            return;
        }

        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.inbox.close();

        self.state.send_replace(SessionState::Closed);
        info!(thread_id = %self.thread_id, reason = %reason, "stream closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close("dropped");
    }
}

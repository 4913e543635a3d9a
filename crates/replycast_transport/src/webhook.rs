//! Inbound webhook adapter
//!
//! The adapter is the only producer into the broker. The ticketing system
//! posts an event describing something that happened on a conversation; the
//! adapter finds the thread id, wraps the payload into an `Event::Webhook`
//! and publishes it on that thread's topic.
//!
//! Deliveries are tolerated rather than validated: only a body that is not
//! JSON at all is rejected. A well-formed body with no resolvable thread id
//! is logged, counted and dropped, and the sender still gets a success.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use replycast_broker::{Broker, Event};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::WebhookError;
use crate::message::WebhookStats;
use crate::notify::Notifier;

/// Event types that carry a new reply for the customer.
pub const REPLY_EVENT_TYPES: &[&str] = &["thread.reply_sent", "thread.message_sent"];

const SUMMARY_TEXT_LIMIT: usize = 140;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Published {
        thread_id: String,
        event_type: Option<String>,
        delivered: usize,
    },
    Dropped {
        event_type: Option<String>,
    },
}

pub struct InboundAdapter {
    broker: Arc<Broker>,
    notifier: Arc<dyn Notifier>,
    received: AtomicU64,
    published: AtomicU64,
    dropped_unroutable: AtomicU64,
}

impl InboundAdapter {
    pub fn new(broker: Arc<Broker>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            broker,
            notifier,
            received: AtomicU64::new(0),
            published: AtomicU64::new(0),
            dropped_unroutable: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> WebhookStats {
        WebhookStats {
            received: self.received.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            dropped_unroutable: self.dropped_unroutable.load(Ordering::Relaxed),
        }
    }

    /// Parse a raw delivery and route it.
    pub fn handle(&self, body: &[u8]) -> Result<WebhookOutcome, WebhookError> {
        let body: Value = serde_json::from_slice(body)?;
        Ok(self.handle_value(&body))
    }

    pub fn handle_value(&self, body: &Value) -> WebhookOutcome {
        self.received.fetch_add(1, Ordering::Relaxed);

        let event_type = extract_event_type(body);
        let payload = payload_of(body);
        let thread_id = extract_thread_id(body);

        debug!(event_type = ?event_type, thread_id = ?thread_id, "processing webhook");

        let outcome = match &thread_id {
            Some(thread_id) => {
                let event = Event::webhook(event_type.clone(), payload.clone());
                let delivered = self.broker.publish(thread_id, event);
                self.published.fetch_add(1, Ordering::Relaxed);
                info!(thread_id = %thread_id, delivered, "emitted webhook event to listeners");
                WebhookOutcome::Published {
                    thread_id: thread_id.clone(),
                    event_type: event_type.clone(),
                    delivered,
                }
            }
            None => {
                self.dropped_unroutable.fetch_add(1, Ordering::Relaxed);
                warn!(event_type = ?event_type, "webhook has no thread id; dropped");
                WebhookOutcome::Dropped {
                    event_type: event_type.clone(),
                }
            }
        };

        if let Some(kind) = event_type.as_deref().filter(|t| REPLY_EVENT_TYPES.contains(t)) {
            let summary = notification_summary(kind, thread_id.as_deref(), payload);
            self.spawn_notification(summary);
        }

        outcome
    }

    fn spawn_notification(&self, summary: String) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime; reply notification skipped");
            return;
        };
        let notifier = self.notifier.clone();
        runtime.spawn(async move {
            if let Err(e) = notifier.notify(&summary).await {
                warn!(error = %e, "reply notification failed");
            }
        });
    }
}

// JavaScript-style truthiness: senders use null, "" and 0 interchangeably
// for "absent".
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn non_empty_id(value: Option<&Value>) -> Option<String> {
    let value = value?;
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) if truthy(value) => Some(n.to_string()),
        _ => None,
    }
}

/// The event body proper: `payload`, else `data`, else the whole delivery.
pub fn payload_of(body: &Value) -> &Value {
    ["payload", "data"]
        .iter()
        .filter_map(|key| body.get(key))
        .find(|v| truthy(v))
        .unwrap_or(body)
}

/// `eventType`, else `type`.
pub fn extract_event_type(body: &Value) -> Option<String> {
    ["eventType", "type"]
        .iter()
        .filter_map(|key| body.get(key))
        .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
        .map(str::to_string)
}

/// Resolve the thread id. First non-empty of:
/// 1. `threadId` on the payload
/// 2. `thread.id` on the payload
/// 3. `threadId` at the top level of the delivery
pub fn extract_thread_id(body: &Value) -> Option<String> {
    let payload = payload_of(body);
    non_empty_id(payload.get("threadId"))
        .or_else(|| non_empty_id(payload.pointer("/thread/id")))
        .or_else(|| non_empty_id(body.get("threadId")))
}

fn first_text<'a>(payload: &'a Value, pointers: &[&str]) -> Option<&'a str> {
    pointers
        .iter()
        .filter_map(|p| payload.pointer(p))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Build the one-line summary used for reply notifications. Every field is
/// optional; missing ones fall back to generic wording.
pub fn notification_summary(event_type: &str, thread_id: Option<&str>, payload: &Value) -> String {
    let author = first_text(
        payload,
        &[
            "/message/author/name",
            "/message/author/fullName",
            "/message/author/email",
            "/actor/name",
            "/author/name",
        ],
    )
    .unwrap_or("Support");

    let subject = first_text(payload, &["/thread/title", "/title"])
        .map(|title| format!("\"{title}\""))
        .or_else(|| thread_id.map(|id| format!("thread {id}")))
        .unwrap_or_else(|| "a conversation".to_string());

    let verb = if event_type == "thread.reply_sent" {
        "replied on"
    } else {
        "sent a message on"
    };

    let text = first_text(
        payload,
        &[
            "/message/text",
            "/message/markdown",
            "/text",
            "/thread/previewText",
        ],
    );

    match text {
        Some(text) => format!("{author} {verb} {subject}: {}", truncate(text, SUMMARY_TEXT_LIMIT)),
        None => format!("{author} {verb} {subject}"),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push('…');
    out
}

//! Event envelope
//!
//! `Event` is what subscribers receive and what the streaming transport
//! serialises onto the wire. It is a tagged union keyed by `"type"` so
//! consumers can match on the kind, with camelCase fields to match what the
//! browser client reads.
//!
//! Notes on variants:
//! - `Connected`: sent directly by a session to its own client, never
//!   through the broker
//! - `Webhook`: produced by the inbound adapter; `payload` is opaque and is
//!   never inspected by the broker
//! - `Unknown`: decode target for kinds this build does not recognise

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    Connected { thread_id: String },

    #[serde(rename_all = "camelCase")]
    Webhook {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event_type: Option<String>,
        #[serde(default)]
        payload: Value,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    #[serde(other)]
    Unknown,
}

impl Event {
    pub fn connected(thread_id: impl Into<String>) -> Self {
        Event::Connected {
            thread_id: thread_id.into(),
        }
    }

    /// Build a webhook event stamped with the current time.
    pub fn webhook(event_type: Option<String>, payload: Value) -> Self {
        Event::Webhook {
            event_type,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::Connected { .. } => "connected",
            Event::Webhook { .. } => "webhook",
            Event::Unknown => "unknown",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

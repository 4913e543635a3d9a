use replycast_broker::BrokerStats;
use serde::{Deserialize, Serialize};

/// Query string of the streaming endpoint.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StreamQuery {
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WebhookStats {
    pub received: u64,
    pub published: u64,
    pub dropped_unroutable: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub broker: BrokerStats,
    pub webhooks: WebhookStats,
}

//! Side notifications
//!
//! When an agent replies, a short human-readable summary is pushed to a
//! side channel (a chat webhook, or just the log). This path is entirely
//! best effort: it runs on its own task and its failures are only logged.

use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::json;
use tracing::info;

use crate::error::NotifyError;

pub trait Notifier: Send + Sync {
    fn notify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), NotifyError>>;
}

/// Writes notifications to the log. Used when no webhook URL is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(async move {
            info!(notification = %text, "reply notification");
            Ok(())
        })
    }
}

/// POSTs `{"text": ...}` to an incoming-webhook URL.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
}

impl HttpNotifier {
    const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(Self::TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl Notifier for HttpNotifier {
    fn notify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(async move {
            self.client
                .post(&self.url)
                .json(&json!({ "text": text }))
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        })
    }
}

use serde::Deserialize;

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub stream: StreamSettings,
    pub notify: NotifySettings,
    pub log: LogSettings,
}

/// Configuration settings for the HTTP server.
///
/// Defines the host and port the server will bind to.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the topic registry.
///
/// `subscriber_buffer` bounds each session's queue of undelivered events.
/// `max_delivery_failures` evicts a subscriber after that many consecutive
/// failed deliveries; `0` disables eviction.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BrokerSettings {
    pub subscriber_buffer: usize,
    pub max_delivery_failures: u32,
}

/// Longest accepted heartbeat interval. Larger values are clamped to it.
pub const MAX_HEARTBEAT_INTERVAL_SECS: u64 = 3600;

/// Configuration settings for streaming sessions.
///
/// `heartbeat_interval_secs` must lie in `1..=MAX_HEARTBEAT_INTERVAL_SECS`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StreamSettings {
    pub heartbeat_interval_secs: u64,
}

/// Side notification channel for replies. Without a URL, notifications
/// only go to the log.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct NotifySettings {
    pub webhook_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub stream: Option<PartialStreamSettings>,
    pub notify: Option<PartialNotifySettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub subscriber_buffer: Option<usize>,
    pub max_delivery_failures: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PartialStreamSettings {
    pub heartbeat_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialNotifySettings {
    pub webhook_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            subscriber_buffer: 64,
            max_delivery_failures: 0,
        }
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 30,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            broker: BrokerSettings::default(),
            stream: StreamSettings::default(),
            notify: NotifySettings::default(),
            log: LogSettings::default(),
        }
    }
}

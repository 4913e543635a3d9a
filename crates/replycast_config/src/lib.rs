//! replycast_config
//!
//! Layered configuration: built-in defaults, then an optional
//! `config/default.*` file, then `REPLYCAST__SECTION__KEY` environment
//! variables.

pub mod settings;
#[cfg(test)]
mod tests;

use crate::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{
    BrokerSettings, LogSettings, MAX_HEARTBEAT_INTERVAL_SECS, NotifySettings, ServerSettings,
    Settings, StreamSettings,
};

pub const ENV_PREFIX: &str = "REPLYCAST";

/// Loads the configuration from `config/default` and environment variables.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from("config/default")
}

/// Same as `load_config`, reading the file layer from `path` (extension
/// optional, any format the `config` crate understands).
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;
    let default = Settings::default();

    Ok(Settings {
        server: ServerSettings {
            host: partial
                .server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: partial
                .server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
        },
        broker: BrokerSettings {
            subscriber_buffer: partial
                .broker
                .as_ref()
                .and_then(|b| b.subscriber_buffer)
                .unwrap_or(default.broker.subscriber_buffer),
            max_delivery_failures: partial
                .broker
                .as_ref()
                .and_then(|b| b.max_delivery_failures)
                .unwrap_or(default.broker.max_delivery_failures),
        },
        stream: StreamSettings {
            heartbeat_interval_secs: partial
                .stream
                .as_ref()
                .and_then(|s| s.heartbeat_interval_secs)
                .filter(|secs| *secs > 0)
                .map(|secs| secs.min(MAX_HEARTBEAT_INTERVAL_SECS))
                .unwrap_or(default.stream.heartbeat_interval_secs),
        },
        notify: NotifySettings {
            webhook_url: partial
                .notify
                .as_ref()
                .and_then(|n| n.webhook_url.clone())
                .filter(|url| !url.trim().is_empty())
                .or(default.notify.webhook_url),
        },
        log: LogSettings {
            level: partial
                .log
                .as_ref()
                .and_then(|l| l.level.clone())
                .unwrap_or(default.log.level),
        },
    })
}

//! CLI for replycast
//!
//! Subcommands:
//! - `server`: run the HTTP server (stream + webhook endpoints)
//! - `watch`: open a thread's event stream and print every frame
//! - `emit`: post a sample webhook for a thread (useful for smoke tests)

use clap::Parser;
use replycast_config::load_config;
use replycast_transport::http::{AppState, start_http_server};
use serde_json::json;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "replycast")]
enum Command {
    /// Start the HTTP server
    Server,
    /// Stream a thread's events to stdout
    Watch {
        /// Base URL of a running server
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        url: String,
        /// Thread to follow
        #[arg(long)]
        thread_id: String,
    },
    /// Send a sample webhook delivery for a thread
    Emit {
        /// Base URL of a running server
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        url: String,
        /// Thread the event belongs to
        #[arg(long)]
        thread_id: String,
        #[arg(long, default_value = "thread.message_sent")]
        event_type: String,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cmd = Command::parse();

    let result = match cmd {
        Command::Server => run_server().await,
        Command::Watch { url, thread_id } => {
            replycast_utils::logging::init("info");
            run_watch(&url, &thread_id).await
        }
        Command::Emit {
            url,
            thread_id,
            event_type,
        } => {
            replycast_utils::logging::init("info");
            run_emit(&url, &thread_id, &event_type).await
        }
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            replycast_utils::logging::init("info");
            return Err(e.into());
        }
    };
    replycast_utils::logging::init(&config.log.level);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_settings(&config)?;
    let broker = state.broker.clone();

    tokio::select! {
        result = start_http_server(&addr, state) => {
            result?;
            error!("HTTP server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!(stats = ?broker.stats(), "Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_watch(url: &str, thread_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut response = reqwest::Client::new()
        .get(format!("{}/api/support/stream", url.trim_end_matches('/')))
        .query(&[("threadId", thread_id)])
        .send()
        .await?
        .error_for_status()?;

    info!(thread_id = %thread_id, "watching stream");

    while let Some(chunk) = response.chunk().await? {
        print!("{}", String::from_utf8_lossy(&chunk));
    }

    info!("stream ended");
    Ok(())
}

async fn run_emit(
    url: &str,
    thread_id: &str,
    event_type: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = json!({
        "eventType": event_type,
        "payload": {
            "thread": { "id": thread_id },
            "message": { "author": { "name": "replycast" }, "text": "Hello from emit" }
        }
    });

    let response = reqwest::Client::new()
        .post(format!("{}/api/webhooks/plain", url.trim_end_matches('/')))
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    println!("{status} {text}");

    if !status.is_success() {
        return Err(format!("webhook rejected with {status}").into());
    }
    Ok(())
}

//! HTTP transport
//!
//! Routes:
//! - `GET /api/support/stream?threadId=…`: server-sent event stream for one
//!   thread. Event frames are `data: <json>`, heartbeats are `: heartbeat`.
//! - `POST /api/webhooks/plain`: webhook intake from the ticketing system.
//! - `GET /health`: liveness plus broker and webhook counters.
//!
//! Each stream request gets its own `Session` running on a spawned task; the
//! response body only drains that session's outbound channel.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    response::sse::{Event as SseEvent, Sse},
    routing::{get, post},
};
use futures_util::{Stream, StreamExt};
use replycast_broker::Broker;
use replycast_config::{Settings, StreamSettings};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::error::{ApiError, NotifyError};
use crate::message::{HealthResponse, StreamQuery, WebhookResponse};
use crate::notify::{HttpNotifier, LogNotifier, Notifier};
use crate::session::{Frame, Session};
use crate::webhook::InboundAdapter;

/// Frames a session may queue ahead of a slow client.
const OUTBOUND_BUFFER: usize = 32;

#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<Broker>,
    pub adapter: Arc<InboundAdapter>,
    pub stream: StreamSettings,
}

impl AppState {
    pub fn new(broker: Arc<Broker>, notifier: Arc<dyn Notifier>, stream: StreamSettings) -> Self {
        let adapter = Arc::new(InboundAdapter::new(broker.clone(), notifier));
        Self {
            broker,
            adapter,
            stream,
        }
    }

    /// Build the broker and notifier described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, NotifyError> {
        let broker = Arc::new(Broker::new(settings.broker.clone()));
        let notifier: Arc<dyn Notifier> = match &settings.notify.webhook_url {
            Some(url) => {
                info!(url = %url, "reply notifications go to webhook");
                Arc::new(HttpNotifier::new(url.clone())?)
            }
            None => Arc::new(LogNotifier),
        };
        Ok(Self::new(broker, notifier, settings.stream.clone()))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/support/stream", get(stream))
        .route("/api/webhooks/plain", post(webhook))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn start_http_server(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

fn to_sse(frame: Frame) -> Result<SseEvent, axum::Error> {
    match frame {
        Frame::Event(event) => SseEvent::default().json_data(&event),
        Frame::Heartbeat => Ok(SseEvent::default().comment("heartbeat")),
    }
}

async fn stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, axum::Error>>>, ApiError> {
    let session = Session::open(&state.broker, query.thread_id.as_deref(), &state.stream)
        .inspect_err(|e| warn!(error = %e, "rejected stream request"))?;

    let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
    tokio::spawn(session.run(tx));

    Ok(Sse::new(ReceiverStream::new(rx).map(to_sse)))
}

async fn webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    info!(body_len = body.len(), "webhook received");

    state.adapter.handle(&body)?;

    Ok(Json(WebhookResponse {
        success: true,
        message: "Webhook processed and clients notified".to_string(),
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        broker: state.broker.stats(),
        webhooks: state.adapter.stats(),
    })
}

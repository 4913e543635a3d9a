//! replycast_transport
//!
//! Everything that touches the outside world:
//! - `session`: binds one streaming connection to one broker subscription
//! - `webhook`: turns inbound webhook deliveries into broker publishes
//! - `notify`: best-effort side notifications for agent replies
//! - `http`: the axum server exposing both endpoints

pub mod error;
pub mod http;
pub mod message;
pub mod notify;
pub mod session;
pub mod webhook;


pub use error::{ApiError, NotifyError, SessionError, WebhookError};
pub use http::{AppState, router, start_http_server};
pub use notify::{HttpNotifier, LogNotifier, Notifier};
pub use session::{Frame, Session, SessionState};
pub use webhook::{InboundAdapter, WebhookOutcome};

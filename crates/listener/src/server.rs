//! The webhook HTTP server.
//!
//! One route receives every GitHub delivery: `POST /`. Each request is
//! verified, normalised, dispatched to Jenkins, and then forwarded. The
//! response does not report whether any Jenkins job was started.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use delivery::Dispatcher;
use thiserror::Error;
use tracing::{debug, info, instrument, warn, Instrument};
use triggers::{normalize, Config, ConfigError, DeliveryId, EventKind, JenkinsApi};

use crate::forward::{ForwardError, Forwarder};
use crate::signature;

pub const HEADER_EVENT: &str = "x-github-event";
pub const HEADER_SIGNATURE: &str = "x-hub-signature";
pub const HEADER_DELIVERY: &str = "x-github-delivery";

/// Largest payload GitHub delivers (25 MB).
pub const MAX_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared handler state. Cloned per request; the inner data is never mutated.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    secret: Option<String>,
    dispatcher: Dispatcher,
    forwarder: Forwarder,
}

impl AppState {
    pub fn new(config: Arc<Config>, jenkins: Arc<dyn JenkinsApi>, http: reqwest::Client) -> Self {
        let secret = config.secret().map(str::to_owned);
        let forwarder = Forwarder::new(http, config.forward.clone());
        Self {
            inner: Arc::new(AppStateInner {
                secret,
                dispatcher: Dispatcher::new(config, jenkins),
                forwarder,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a webhook request was refused.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Got non-JSON payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    #[error(transparent)]
    Forward(#[from] ForwardError),

    #[error("Dispatch task failed: {message}")]
    Dispatch { message: String },
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::MalformedPayload(_) | Self::Forward(_) | Self::Dispatch { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        warn!(status = status.as_u16(), error = %self, "Rejecting webhook");
        (status, self.to_string()).into_response()
    }
}

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(webhook_handler))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_PAYLOAD_BYTES))
        .with_state(state)
}

/// Binds `0.0.0.0:<port>` and serves until the process is stopped.
pub async fn serve(config: Arc<Config>, jenkins: Arc<dyn JenkinsApi>) -> Result<(), ListenerError> {
    let port = config.port()?;
    let http = reqwest::Client::builder().build()?;
    let app = build_router(AppState::new(config, jenkins, http));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "Starting daemon listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

#[instrument(
    name = "github.webhook",
    skip_all,
    fields(
        event = tracing::field::Empty,
        delivery = tracing::field::Empty,
    )
)]
async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    let event_name = header_str(&headers, HEADER_EVENT).unwrap_or_default();
    let delivery = header_str(&headers, HEADER_DELIVERY)
        .and_then(|id| DeliveryId::new(id))
        .unwrap_or_else(DeliveryId::generate);

    let span = tracing::Span::current();
    span.record("event", event_name);
    span.record("delivery", delivery.as_str());

    if let Some(secret) = &state.inner.secret {
        let sig = header_str(&headers, HEADER_SIGNATURE).unwrap_or_default();
        if !signature::verify(secret, &body, sig) {
            return Err(WebhookError::InvalidSignature);
        }
    }

    let kind = EventKind::parse(event_name);
    if kind == EventKind::Ping {
        info!("Got ping event");
        return Ok(StatusCode::OK);
    }

    let payload: serde_json::Value =
        serde_json::from_slice(&body).map_err(WebhookError::MalformedPayload)?;
    let event = normalize(&payload, kind);
    debug!(repository = %event.repository, branch = %event.branch, "Normalized event");

    // Runs on its own task so a client disconnect cannot cut retries short.
    let dispatcher = state.inner.dispatcher.clone();
    let outcome = tokio::spawn(
        async move { dispatcher.dispatch(&event).await }.instrument(span.clone()),
    )
    .await
    .map_err(|e| WebhookError::Dispatch {
        message: e.to_string(),
    })?;
    info!(
        matched = outcome.matched,
        delivered = outcome.delivered.len(),
        skipped = outcome.skipped,
        aborted = outcome.aborted.is_some(),
        "Processed triggers"
    );

    state.inner.forwarder.forward(&body, &headers).await?;

    Ok(StatusCode::OK)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

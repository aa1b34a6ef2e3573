//! Re-sends accepted webhook payloads to the configured `forward` targets.

use axum::body::Bytes;
use axum::http::HeaderMap;
use thiserror::Error;
use tracing::{debug, instrument};
use triggers::ForwardTarget;

/// Request headers copied onto forwarded requests when a target asks for them.
pub const FORWARDED_HEADERS: [&str; 4] = [
    "x-github-event",
    "x-hub-signature",
    "x-github-delivery",
    "content-type",
];

#[derive(Debug, Error)]
#[error("Error forwarding payload to {url}: {source}")]
pub struct ForwardError {
    pub url: String,
    #[source]
    pub source: reqwest::Error,
}

/// Posts payload copies to every forward target, in configuration order.
#[derive(Debug, Clone)]
pub struct Forwarder {
    http: reqwest::Client,
    targets: Vec<ForwardTarget>,
}

impl Forwarder {
    pub fn new(http: reqwest::Client, targets: Vec<ForwardTarget>) -> Self {
        Self { http, targets }
    }

    /// Targets with an empty URL are skipped. Stops at the first target that
    /// cannot be reached; the target's status code is ignored.
    #[instrument(name = "listener.forward", skip_all, fields(targets = self.targets.len()))]
    pub async fn forward(&self, body: &Bytes, headers: &HeaderMap) -> Result<(), ForwardError> {
        for target in self.targets.iter().filter(|t| !t.url.is_empty()) {
            let mut request = self.http.post(&target.url).body(body.clone());

            if target.headers {
                for name in FORWARDED_HEADERS {
                    if let Some(value) = headers.get(name) {
                        request = request.header(name, value.clone());
                    }
                }
            }

            let response = request.send().await.map_err(|source| ForwardError {
                url: target.url.clone(),
                source,
            })?;
            debug!(url = %target.url, status = response.status().as_u16(), "Forwarded payload");
        }

        Ok(())
    }
}

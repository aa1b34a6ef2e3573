//! The configuration document.
//!
//! Loaded once at startup, then shared read-only (behind an `Arc`) by every
//! request handler. Nothing mutates it after [`Config::from_json`] returns.
//!
//! Field names follow the JSON document operators already write:
//!
//! ```json
//! {
//!   "port": "31000",
//!   "secret": "...",
//!   "jenkins": { "user": "...", "token": "...", "base_url": "...", "endpoints": [...] },
//!   "triggers": { "jenkins": [ { "endpoint": "...", "events": { ... } } ] },
//!   "forward": [ { "url": "...", "headers": true } ]
//! }
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use crate::{ConfigError, EndpointDefinition, EndpointId, Trigger};

/// Port used when the document has no `port` field.
pub const DEFAULT_PORT: u16 = 31000;

/// Jenkins connection details and endpoint catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JenkinsSettings {
    #[serde(default)]
    pub user: String,
    /// API token used as the basic-auth password.
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub endpoints: Vec<EndpointDefinition>,
}

/// The `triggers` section. Only Jenkins triggers exist today.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerCatalog {
    #[serde(default)]
    pub jenkins: Vec<Trigger>,
}

/// Another URL that receives a copy of every processed payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ForwardTarget {
    pub url: String,
    /// Copy the GitHub delivery headers onto the forwarded request.
    #[serde(default)]
    pub headers: bool,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    version: String,
    #[serde(default)]
    port: String,
    #[serde(default)]
    secret: String,
    #[serde(default)]
    jenkins: JenkinsSettings,
    #[serde(default)]
    triggers: TriggerCatalog,
    #[serde(default)]
    forward: Vec<ForwardTarget>,
}

/// Fully loaded configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub version: String,
    port: String,
    secret: Option<String>,
    pub jenkins: JenkinsSettings,
    pub triggers: Vec<Trigger>,
    pub forward: Vec<ForwardTarget>,
    endpoints: HashMap<EndpointId, usize>,
    duplicate_endpoints: Vec<EndpointId>,
}

impl Config {
    /// Parses the JSON document and indexes the endpoint catalog.
    ///
    /// Duplicate endpoint identifiers are accepted: the last definition wins.
    /// Each overwritten identifier is reported by [`Config::duplicate_endpoints`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let doc: Document = serde_json::from_str(text)?;

        let mut endpoints = HashMap::with_capacity(doc.jenkins.endpoints.len());
        let mut duplicate_endpoints = Vec::new();
        for (index, endpoint) in doc.jenkins.endpoints.iter().enumerate() {
            if endpoints.insert(endpoint.id.clone(), index).is_some() {
                duplicate_endpoints.push(endpoint.id.clone());
            }
        }

        Ok(Self {
            version: doc.version,
            port: doc.port,
            secret: Some(doc.secret).filter(|s| !s.is_empty()),
            jenkins: doc.jenkins,
            triggers: doc.triggers.jenkins,
            forward: doc.forward,
            endpoints,
            duplicate_endpoints,
        })
    }

    /// Looks up an endpoint definition by identifier.
    pub fn endpoint(&self, id: &EndpointId) -> Option<&EndpointDefinition> {
        self.endpoints
            .get(id)
            .and_then(|&index| self.jenkins.endpoints.get(index))
    }

    /// Endpoint identifiers that appeared more than once, in document order.
    pub fn duplicate_endpoints(&self) -> &[EndpointId] {
        &self.duplicate_endpoints
    }

    /// Shared secret for webhook signature verification, if configured.
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    /// Listening port. Defaults to [`DEFAULT_PORT`] when the field is absent.
    pub fn port(&self) -> Result<u16, ConfigError> {
        let raw = self.port.trim();
        if raw.is_empty() {
            return Ok(DEFAULT_PORT);
        }
        raw.parse().map_err(|_| ConfigError::InvalidPort {
            value: self.port.clone(),
        })
    }
}

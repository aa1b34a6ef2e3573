//! `reqwest`-backed [`JenkinsApi`] implementation.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use triggers::{JenkinsApi, JenkinsError, JenkinsSettings};

/// Crumb issuer query, relative to the base URL.
pub const CRUMB_ISSUER_PATH: &str =
    "crumbIssuer/api/xml?xpath=concat(//crumbRequestField,\":\",//crumb)";

/// Header carrying the crumb on state-changing requests.
pub const CRUMB_HEADER: &str = "Jenkins-Crumb";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Talks to one Jenkins instance with one set of credentials.
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    token: String,
}

impl JenkinsClient {
    /// Builds a client with a fresh connection pool.
    pub fn new(settings: &JenkinsSettings) -> Result<Self, JenkinsError> {
        let http = reqwest::Client::builder().build().map_err(transport)?;
        Ok(Self::with_http_client(http, settings))
    }

    /// Builds a client around an existing `reqwest::Client`.
    pub fn with_http_client(http: reqwest::Client, settings: &JenkinsSettings) -> Self {
        Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            user: settings.user.clone(),
            token: settings.token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl JenkinsApi for JenkinsClient {
    async fn fetch_crumb(&self) -> Result<String, JenkinsError> {
        let response = self
            .http
            .get(self.url(CRUMB_ISSUER_PATH))
            .basic_auth(&self.user, Some(&self.token))
            .send()
            .await
            .map_err(transport)?;

        // Status is not checked; only the body decides.
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        debug!(status = status.as_u16(), "Crumb issuer answered");

        parse_crumb(&body)
    }

    async fn trigger_job(&self, path: &str, crumb: &str) -> Result<u16, JenkinsError> {
        let response = self
            .http
            .post(self.url(path))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .basic_auth(&self.user, Some(&self.token))
            .header(CRUMB_HEADER, crumb)
            .send()
            .await
            .map_err(transport)?;

        Ok(response.status().as_u16())
    }
}

/// Extracts the crumb value from a `field:value` issuer response.
pub fn parse_crumb(body: &str) -> Result<String, JenkinsError> {
    body.split_once(':')
        .map(|(_, value)| value.trim_end().to_string())
        .ok_or_else(|| JenkinsError::MalformedCrumb {
            body: body.to_string(),
        })
}

fn transport(e: reqwest::Error) -> JenkinsError {
    JenkinsError::Transport {
        message: e.to_string(),
    }
}

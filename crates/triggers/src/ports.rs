//! Port traits implemented by infrastructure crates.
//!
//! The delivery loop only ever talks to Jenkins through [`JenkinsApi`]; the
//! `jenkins` crate supplies the HTTP implementation and tests supply scripted
//! fakes.

use async_trait::async_trait;

use crate::JenkinsError;

/// The two Jenkins calls a delivery needs.
///
/// Implementations hold the base URL and credentials. Both methods are called
/// once per delivery attempt; crumbs are never cached.
#[async_trait]
pub trait JenkinsApi: Send + Sync {
    /// Fetches a fresh crumb (anti-CSRF token) and returns its value.
    async fn fetch_crumb(&self) -> Result<String, JenkinsError>;

    /// POSTs to `path` (relative to the base URL) with the crumb attached and
    /// returns the response status code. Any status is `Ok`; only transport
    /// failures are errors.
    async fn trigger_job(&self, path: &str, crumb: &str) -> Result<u16, JenkinsError>;
}

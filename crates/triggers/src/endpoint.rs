//! Jenkins endpoint definitions: where a trigger posts, and how hard it tries.
//!
//! Retry and success fields are kept as the strings found in the configuration
//! document and parsed on use. A malformed value only disables the triggers
//! that reach this endpoint; the rest of the configuration keeps working.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, EndpointId};

/// Placeholder replaced with the event's repository name.
pub const REPOSITORY_PLACEHOLDER: &str = "{{.repository}}";

/// Placeholder replaced with the event's branch name.
pub const BRANCH_PLACEHOLDER: &str = "{{.branch}}";

const DEFAULT_RETRY_COUNT: i64 = 1;
const DEFAULT_RETRY_DELAY_SECS: u64 = 0;

/// One entry of the `jenkins.endpoints` catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDefinition {
    pub id: EndpointId,
    /// Path relative to the Jenkins base URL, e.g.
    /// `job/{{.repository}}/job/{{.branch}}/build`.
    pub path: String,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub success: SuccessCriteria,
}

/// Raw `retry` section. Empty strings select the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Seconds to wait after a failed attempt (default `0`).
    #[serde(default)]
    pub delay: String,
    /// Maximum number of attempts (default `1`).
    #[serde(default)]
    pub count: String,
}

/// Raw `success` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessCriteria {
    /// Status code that marks the job as queued, e.g. `"201"`.
    #[serde(default)]
    pub http_status: String,
}

impl EndpointDefinition {
    /// Maximum number of delivery attempts.
    ///
    /// Zero and negative values parse successfully; the delivery loop treats
    /// them as an already exhausted budget.
    pub fn retry_count(&self) -> Result<i64, ConfigError> {
        let raw = self.retry.count.trim();
        if raw.is_empty() {
            return Ok(DEFAULT_RETRY_COUNT);
        }
        raw.parse().map_err(|_| ConfigError::InvalidRetryCount {
            endpoint: self.id.clone(),
            value: self.retry.count.clone(),
        })
    }

    /// Flat delay applied after every failed attempt. Negative values mean no
    /// delay.
    pub fn retry_delay(&self) -> Result<Duration, ConfigError> {
        let raw = self.retry.delay.trim();
        if raw.is_empty() {
            return Ok(Duration::from_secs(DEFAULT_RETRY_DELAY_SECS));
        }
        let secs: i64 = raw.parse().map_err(|_| ConfigError::InvalidRetryDelay {
            endpoint: self.id.clone(),
            value: self.retry.delay.clone(),
        })?;
        Ok(Duration::from_secs(u64::try_from(secs).unwrap_or(0)))
    }

    /// `true` when `status` equals the configured success status.
    ///
    /// An unparsable (or missing) expectation never matches, so such an
    /// endpoint exhausts its retries.
    pub fn is_success(&self, status: u16) -> bool {
        self.success
            .http_status
            .trim()
            .parse::<u16>()
            .is_ok_and(|expected| expected == status)
    }

    /// Substitutes the repository and branch placeholders in the path template.
    ///
    /// Values are inserted verbatim; they come from an event that already
    /// matched a trigger.
    pub fn build_path(&self, repository: &str, branch: &str) -> String {
        self.path
            .replace(REPOSITORY_PLACEHOLDER, repository)
            .replace(BRANCH_PLACEHOLDER, branch)
    }
}

//! Error types for the trigger domain.
//!
//! Matching never fails: a payload that cannot be evaluated simply does not
//! match. The errors here cover the configuration document, the Jenkins port,
//! and the outcome of a delivery's retry loop.
//!
//! | Condition | Type | Consequence |
//! |-----------|------|-------------|
//! | Bad JSON document | [`ConfigError::Parse`] | process refuses to start |
//! | Non-numeric retry field | [`ConfigError::InvalidRetryCount`] / [`ConfigError::InvalidRetryDelay`] | trigger skipped |
//! | Crumb or POST failed | [`JenkinsError`] | attempt retried |
//! | Wrong status code | [`AttemptFailure::UnexpectedStatus`] | attempt retried |
//! | Budget spent | [`DeliveryError::Exhausted`] | remaining triggers abandoned |

use thiserror::Error;

use crate::EndpointId;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors raised while loading or interpreting the configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON or does not have the expected shape.
    #[error("Configuration document is invalid: {0}")]
    Parse(#[from] serde_json::Error),

    /// The `port` field is not a valid TCP port.
    #[error("Invalid listening port '{value}'")]
    InvalidPort {
        /// Raw value from the document.
        value: String,
    },

    /// An endpoint's `retry.count` is not an integer.
    #[error("Value of retry.count for endpoint '{endpoint}' cannot be converted to int: '{value}'")]
    InvalidRetryCount {
        /// Endpoint carrying the bad value.
        endpoint: EndpointId,
        /// Raw value from the document.
        value: String,
    },

    /// An endpoint's `retry.delay` is not an integer.
    #[error("Value of retry.delay for endpoint '{endpoint}' cannot be converted to int: '{value}'")]
    InvalidRetryDelay {
        /// Endpoint carrying the bad value.
        endpoint: EndpointId,
        /// Raw value from the document.
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Jenkins port errors
// ---------------------------------------------------------------------------

/// Failures reported by a [`crate::JenkinsApi`] implementation.
///
/// Both variants are retryable within a delivery's budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JenkinsError {
    /// The request never produced a response (DNS, connect, TLS, I/O).
    #[error("Request to Jenkins failed: {message}")]
    Transport {
        /// Description from the underlying HTTP client.
        message: String,
    },

    /// The crumb issuer answered with a body that is not `field:value`.
    #[error("Crumb issuer returned an unparsable body: '{body}'")]
    MalformedCrumb {
        /// The body as received.
        body: String,
    },
}

// ---------------------------------------------------------------------------
// Delivery errors
// ---------------------------------------------------------------------------

/// Why a single delivery attempt did not succeed.
///
/// Never returned to callers; attempts are logged and retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    /// No crumb could be obtained.
    #[error("Error getting crumb: {0}")]
    Crumb(JenkinsError),

    /// The job POST itself failed.
    #[error("Error from request to {path}: {source}")]
    Send {
        /// Substituted endpoint path.
        path: String,
        /// Underlying failure.
        source: JenkinsError,
    },

    /// Jenkins answered with a status other than the configured one.
    #[error("HTTP status {actual} different than expected '{expected}'")]
    UnexpectedStatus {
        /// Raw `success.http_status` value from the endpoint definition.
        expected: String,
        /// Status code Jenkins returned.
        actual: u16,
    },
}

/// Terminal failure of a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Every attempt in the retry budget failed (or the budget was not positive).
    #[error("Unable to post to endpoint {path} after {attempts} attempt(s)")]
    Exhausted {
        /// Endpoint path template, for diagnostics.
        path: String,
        /// Number of attempts actually made.
        attempts: u32,
        /// Failure of the final attempt, if any attempt was made.
        last_failure: Option<AttemptFailure>,
    },
}

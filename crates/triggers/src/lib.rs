//! Core domain for hooked-jenkins.
//!
//! This crate decides *whether* a GitHub webhook delivery should start a
//! Jenkins job, and describes *where* and *how persistently* to start it.
//! Running the delivery is left to the `delivery` crate; talking HTTP is left
//! to the `jenkins` and `listener` crates.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`EndpointId`, `DeliveryId`) |
//! | [`errors`] | Configuration, Jenkins, and delivery error types |
//! | [`event`] | Payload normalisation (`normalize`, `NormalizedEvent`) |
//! | [`rules`] | Trigger condition blocks and the matching algorithm |
//! | [`endpoint`] | Endpoint definitions: path templates, retry and success policy |
//! | [`config`] | The configuration document |
//! | [`ports`] | The `JenkinsApi` trait |

pub mod config;
pub mod endpoint;
pub mod errors;
pub mod event;
pub mod identifiers;
pub mod ports;
pub mod rules;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{Config, ForwardTarget, JenkinsSettings, DEFAULT_PORT};
pub use endpoint::{EndpointDefinition, RetrySettings, SuccessCriteria};
pub use errors::{AttemptFailure, ConfigError, DeliveryError, JenkinsError};
pub use event::{normalize, EventKind, NormalizedEvent};
pub use identifiers::{DeliveryId, EmptyIdentifier, EndpointId};
pub use ports::JenkinsApi;
pub use rules::{BranchRule, ConditionBlock, EventConditions, RepositoryRule, Trigger};

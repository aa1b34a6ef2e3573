//! Delivery orchestration for hooked-jenkins.
//!
//! This crate turns a matched trigger into a Jenkins job POST. It provides the
//! [`DeliveryExecutor`], which runs one endpoint's bounded retry loop, and the
//! [`Dispatcher`], which walks the configured triggers for one incoming event.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The executor and dispatcher sequence calls between
//! business logic in the [`triggers`] crate and the [`triggers::JenkinsApi`]
//! port. They contain no matching rules of their own.
//!
//! ## Failure policy
//!
//! A delivery that exhausts its retries stops the dispatcher: triggers later in
//! the configuration are not evaluated for that event. Triggers whose endpoint
//! is missing or has a malformed retry policy are skipped without stopping.

pub mod dispatcher;
pub mod executor;

#[cfg(test)]
pub(crate) mod test_support;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use executor::{DeliveryExecutor, DeliveryReceipt};

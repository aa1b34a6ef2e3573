//! Jenkins HTTP adapter.
//!
//! Implements the [`triggers::JenkinsApi`] trait over HTTP with `reqwest`:
//!
//! - **Crumb fetch**: `GET {base_url}/crumbIssuer/api/xml?xpath=concat(//crumbRequestField,":",//crumb)`
//!   with basic auth. The issuer answers `Jenkins-Crumb:<value>`.
//! - **Job trigger**: `POST {base_url}/{path}` with basic auth, the crumb in
//!   the `Jenkins-Crumb` header, `Content-Type: application/x-www-form-urlencoded`,
//!   and an empty body.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL construction, authentication, and response parsing
//! live here. The `delivery` crate sees only [`triggers::JenkinsApi`].
//!
//! No request timeout is configured; calls rely on the transport defaults.

pub mod client;

pub use client::{parse_crumb, JenkinsClient, CRUMB_HEADER, CRUMB_ISSUER_PATH};

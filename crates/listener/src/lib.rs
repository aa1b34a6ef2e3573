//! GitHub webhook receiver for hooked-jenkins.
//!
//! Accepts deliveries on `POST /`, checks the `X-Hub-Signature` HMAC when a
//! secret is configured, hands the normalised event to the
//! [`delivery::Dispatcher`], and finally forwards the raw payload to any
//! configured mirrors.
//!
//! ## Architectural Layer
//!
//! **Infrastructure layer.** Owns the HTTP surface (axum) and the outbound
//! forwarding client (reqwest). Matching and retry decisions live in the
//! `triggers` and `delivery` crates.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`server`] | Router, handler, and `serve` |
//! | [`signature`] | HMAC-SHA1 signature check |
//! | [`forward`] | Payload forwarding to mirror URLs |

pub mod forward;
pub mod server;
pub mod signature;

pub use forward::{ForwardError, Forwarder, FORWARDED_HEADERS};
pub use server::{build_router, serve, AppState, ListenerError, WebhookError};

//! Event extraction: reduces a raw GitHub payload to the fields trigger rules
//! look at.
//!
//! GitHub payloads are large and their shape varies per event kind. Rather
//! than modelling them, [`normalize`] walks the parsed JSON tree with
//! JSON-pointer lookups and degrades every missing or wrongly-typed field to an
//! empty string. Partial or malformed payloads therefore produce an event that
//! cannot match, never an error.

use std::fmt;

use serde_json::Value;

// ---------------------------------------------------------------------------
// Event kinds
// ---------------------------------------------------------------------------

/// The GitHub event kind, taken from the `X-GitHub-Event` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Commits pushed to a branch or tag.
    Push,
    /// Pull request opened, synchronised, closed, etc.
    PullRequest,
    /// Branch or tag created.
    Create,
    /// Branch or tag deleted.
    Delete,
    /// Sent by GitHub when a hook is first configured.
    Ping,
    /// Any other event; never matched by a trigger.
    Other(String),
}

impl EventKind {
    /// Parses the header value. Unknown names are preserved in [`EventKind::Other`].
    pub fn parse(name: &str) -> Self {
        match name {
            "push" => Self::Push,
            "pull_request" => Self::PullRequest,
            "create" => Self::Create,
            "delete" => Self::Delete,
            "ping" => Self::Ping,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the GitHub name of the event kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Ping => "ping",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Normalized event
// ---------------------------------------------------------------------------

/// The reduced view of one webhook payload. Empty strings mean "not present".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    /// Event kind from the delivery headers.
    pub kind: EventKind,
    /// Repository name (without owner).
    pub repository: String,
    /// Branch name; empty for tags and for kinds that carry no branch.
    pub branch: String,
    /// The raw `ref` field.
    pub git_ref: String,
    /// Pull request action (`opened`, `synchronize`, ...); `pull_request` only.
    pub action: String,
}

/// Extracts a [`NormalizedEvent`] from a parsed payload.
///
/// Field sources per kind:
///
/// | Field | `push` | `create` / `delete` | `pull_request` |
/// |-------|--------|---------------------|----------------|
/// | repository | `repository.name` | `repository.name` | `pull_request.head.repo.name` |
/// | branch | third segment of `ref`, empty for tags | `ref` if `ref_type == "branch"` | empty |
/// | action | empty | empty | `action` |
pub fn normalize(payload: &Value, kind: EventKind) -> NormalizedEvent {
    let git_ref = str_at(payload, "/ref").to_string();

    let repository = match kind {
        EventKind::Push | EventKind::Create | EventKind::Delete => {
            str_at(payload, "/repository/name")
        }
        EventKind::PullRequest => str_at(payload, "/pull_request/head/repo/name"),
        EventKind::Ping | EventKind::Other(_) => "",
    }
    .to_string();

    let branch = match kind {
        EventKind::Push => branch_from_push_ref(&git_ref).to_string(),
        EventKind::Create | EventKind::Delete if str_at(payload, "/ref_type") == "branch" => {
            git_ref.clone()
        }
        _ => String::new(),
    };

    let action = match kind {
        EventKind::PullRequest => str_at(payload, "/action").to_string(),
        _ => String::new(),
    };

    NormalizedEvent {
        kind,
        repository,
        branch,
        git_ref,
        action,
    }
}

/// Returns the string at `pointer`, or `""` when absent or not a string.
fn str_at<'a>(payload: &'a Value, pointer: &str) -> &'a str {
    payload
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// `refs/heads/main` -> `main`; tag refs and short refs -> `""`.
///
/// Only the third segment is taken, so `refs/heads/feature/x` yields `feature`.
fn branch_from_push_ref(git_ref: &str) -> &str {
    let mut segments = git_ref.split('/').skip(1);
    match segments.next() {
        Some("tags" | "tag") | None => "",
        Some(_) => segments.next().unwrap_or_default(),
    }
}

//! Newtype domain identifiers.
//!
//! Endpoint identifiers and webhook delivery identifiers are both strings on
//! the wire. Wrapping them keeps a trigger's endpoint reference from being
//! confused with, say, a repository name when both flow through the same
//! function.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Returned when an identifier is deserialised from an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Identifier must not be empty")]
pub struct EmptyIdentifier;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, and
// serde conversions that go through new().
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl TryFrom<String> for $name {
            type Error = EmptyIdentifier;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(EmptyIdentifier)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Identifies a Jenkins endpoint definition in the `jenkins.endpoints`
    /// catalog. Triggers reference endpoints by this value.
    EndpointId
}

string_id! {
    /// Identifies one webhook delivery, as sent by GitHub in the
    /// `X-GitHub-Delivery` header.
    ///
    /// Used only for log correlation; deliveries are never deduplicated.
    DeliveryId
}

impl DeliveryId {
    /// Generates a random identifier for a delivery that arrived without an
    /// `X-GitHub-Delivery` header.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifier_is_rejected() {
        assert!(EndpointId::new("").is_none());
        assert_eq!(EndpointId::new("deploy").unwrap().as_str(), "deploy");
    }

    #[test]
    fn generated_delivery_ids_are_distinct() {
        let a = DeliveryId::generate();
        let b = DeliveryId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn endpoint_id_deserialises_from_plain_string() {
        let id: EndpointId = serde_json::from_str("\"build-app\"").unwrap();
        assert_eq!(id.to_string(), "build-app");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"build-app\"");
    }

    #[test]
    fn empty_identifier_is_rejected_when_deserialising() {
        assert!(serde_json::from_str::<EndpointId>("\"\"").is_err());
        assert!(serde_json::from_str::<DeliveryId>("\"\"").is_err());
    }
}

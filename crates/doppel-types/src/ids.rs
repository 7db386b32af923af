//! Strongly-typed identifiers for Doppel entities.
//!
//! All IDs are UUID-based but wrapped in newtype structs for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for an environment.
    EnvironmentId,
    "env"
);

uuid_id!(
    /// Unique identifier for a simulated endpoint.
    EndpointId,
    "endpoint"
);

uuid_id!(
    /// Unique identifier for one call-log row.
    CallId,
    "call"
);

uuid_id!(
    /// Correlation identifier attached to one request/response pair.
    CorrelationId,
    "corr"
);

uuid_id!(
    /// Unique identifier for a fabricated business record.
    RecordId,
    "rec"
);

uuid_id!(
    /// Identifier for one bulk-generation batch.
    BatchId,
    "batch"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_prefix() {
        let id = EndpointId::generate();
        assert!(id.to_string().starts_with("endpoint:"));
    }

    #[test]
    fn ids_round_trip_through_serde() {
        let id = RecordId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}

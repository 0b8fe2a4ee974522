//! UUID-backed identifiers for server-assigned records.

use std::fmt;

/// Error raised when an identifier is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} must be a valid UUID")]
pub struct InvalidRecordId {
    kind: &'static str,
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
            utoipa::ToSchema,
        )]
        #[serde(transparent)]
        #[schema(value_type = String, format = Uuid)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Allocate a fresh random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidRecordId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| InvalidRecordId { kind: $kind })
            }
        }
    };
}

record_id!(
    /// Organization identifier.
    OrganizationId,
    "organization id"
);
record_id!(
    /// Address identifier.
    AddressId,
    "address id"
);
record_id!(
    /// Contact identifier.
    ContactId,
    "contact id"
);
record_id!(
    /// Review identifier.
    ReviewId,
    "review id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reports_the_identifier_kind() {
        let error = "nope".parse::<ReviewId>().expect_err("not a uuid");
        assert_eq!(error.to_string(), "review id must be a valid UUID");
    }

    #[test]
    fn parse_accepts_padded_uuids() {
        let id = ReviewId::random();
        let parsed: ReviewId = format!(" {id} ").parse().expect("uuid parses");
        assert_eq!(parsed, id);
    }
}

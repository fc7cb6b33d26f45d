//! Newtype IDs for type-safe record references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different record types. Every ID is backed by
//! a UUID and travels as its canonical hyphenated string, both in documents
//! and at the framework boundary.

use thiserror::Error;

/// Errors that can occur when parsing an ID from its external string form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input is not a well-formed identifier.
    #[error("malformed {kind} `{input}`")]
    Malformed {
        /// Name of the ID type that failed to parse.
        kind: &'static str,
        /// The rejected input.
        input: String,
    },
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `uuid::Uuid` with:
/// - `Serialize`/`Deserialize` as the hyphenated string form (in every format,
///   including BSON)
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - `generate()` using the supplied UUID constructor
/// - `parse()`, `FromStr`, `Display`, `as_uuid()`
///
/// # Example
///
/// ```rust
/// # use docstore_identity_core::define_id;
/// define_id!(TicketId, uuid::Uuid::now_v7);
/// define_id!(QueueId, uuid::Uuid::new_v4);
///
/// let ticket = TicketId::generate();
/// let parsed = TicketId::parse(&ticket.to_string()).unwrap();
/// assert_eq!(ticket, parsed);
///
/// // These are different types, so this won't compile:
/// // let _: QueueId = ticket;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $generator:path) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Generate a fresh identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self($generator())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }

            /// Parse an identifier from its external string form.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Malformed` if the input is not a UUID.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                ::uuid::Uuid::parse_str(s).map(Self).map_err(|_| {
                    $crate::types::id::IdError::Malformed {
                        kind: stringify!($name),
                        input: s.to_owned(),
                    }
                })
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let raw = <::std::string::String as ::serde::Deserialize>::deserialize(deserializer)?;
                Self::parse(&raw).map_err(::serde::de::Error::custom)
            }
        }

        impl From<$name> for ::bson::Bson {
            fn from(id: $name) -> Self {
                ::bson::Bson::String(id.to_string())
            }
        }
    };
}

// Users and memberships are time-ordered, like a time-seeded object id.
define_id!(UserId, ::uuid::Uuid::now_v7);
define_id!(MembershipId, ::uuid::Uuid::now_v7);
define_id!(RoleId, ::uuid::Uuid::new_v4);

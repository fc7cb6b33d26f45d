//! Persisted record shapes.
//!
//! Three kinds of documents live in three collections:
//!
//! - [`UserRecord`] in `users`
//! - [`RoleRecord`] in `roles`
//! - [`MembershipRecord`] in `user_roles`, the join between the two
//!
//! Membership existence is the only source of truth for "user has role";
//! users carry no role list.
//!
//! Applications declare their own user and role types by embedding a record
//! and implementing [`IdentityUser`] / [`IdentityRole`].

pub mod membership;
pub mod role;
pub mod user;

use serde::Serialize;
use serde::de::DeserializeOwned;

use docstore_identity_core::{Document, GatewayError};

pub use membership::MembershipRecord;
pub use role::RoleRecord;
pub use user::UserRecord;

/// Document field names used in filters.
pub(crate) mod fields {
    pub const ID: &str = "_id";
    pub const NORMALIZED_USER_NAME: &str = "normalizedUserName";
    pub const NORMALIZED_EMAIL: &str = "normalizedEmail";
    pub const NORMALIZED_NAME: &str = "normalizedName";
    pub const USER_ID: &str = "userId";
    pub const ROLE_ID: &str = "roleId";
}

/// A user type the stores can persist.
///
/// # Example
///
/// ```rust
/// use docstore_identity::{IdentityUser, UserRecord};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct ApplicationUser {
///     #[serde(flatten)]
///     identity: UserRecord,
///     display_name: String,
/// }
///
/// impl IdentityUser for ApplicationUser {
///     fn identity(&self) -> &UserRecord {
///         &self.identity
///     }
///
///     fn identity_mut(&mut self) -> &mut UserRecord {
///         &mut self.identity
///     }
/// }
/// ```
pub trait IdentityUser: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The identity attributes of this user.
    fn identity(&self) -> &UserRecord;

    /// Mutable access to the identity attributes of this user.
    fn identity_mut(&mut self) -> &mut UserRecord;
}

/// A role type the stores can persist.
pub trait IdentityRole: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The identity attributes of this role.
    fn identity(&self) -> &RoleRecord;

    /// Mutable access to the identity attributes of this role.
    fn identity_mut(&mut self) -> &mut RoleRecord;
}

impl IdentityUser for UserRecord {
    fn identity(&self) -> &UserRecord {
        self
    }

    fn identity_mut(&mut self) -> &mut UserRecord {
        self
    }
}

impl IdentityRole for RoleRecord {
    fn identity(&self) -> &RoleRecord {
        self
    }

    fn identity_mut(&mut self) -> &mut RoleRecord {
        self
    }
}

/// Serialize a record into a document.
pub(crate) fn encode<T: Serialize>(record: &T) -> Result<Document, GatewayError> {
    Ok(bson::to_document(record)?)
}

/// Deserialize a record from a document.
pub(crate) fn decode<T: DeserializeOwned>(document: Document) -> Result<T, GatewayError> {
    Ok(bson::from_document(document)?)
}

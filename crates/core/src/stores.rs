//! Capability traits consumed by the identity framework.
//!
//! A single concrete store implements several narrow capabilities; the
//! framework asks for the ones it needs. Every operation takes a
//! [`CancellationToken`] that is checked before any work begins.
//!
//! Accessors and setters work on the in-memory record only. Changes reach the
//! database only through an explicit `update`.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Identity core: id and user-name CRUD plus lookup.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// User type declared by the embedding application.
    type User: Send + Sync;

    /// The user's identifier in its external string form.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` if the user has not been created yet.
    fn user_id(&self, user: &Self::User, cancel: &CancellationToken) -> Result<String>;

    /// The user's display name.
    fn user_name(&self, user: &Self::User, cancel: &CancellationToken) -> Result<Option<String>>;

    /// Set the display name in memory.
    fn set_user_name(
        &self,
        user: &mut Self::User,
        user_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// The framework-normalized user name.
    fn normalized_user_name(
        &self,
        user: &Self::User,
        cancel: &CancellationToken,
    ) -> Result<Option<String>>;

    /// Set the normalized user name in memory.
    fn set_normalized_user_name(
        &self,
        user: &mut Self::User,
        normalized_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Assign a new identifier to the user and insert it.
    async fn create(&self, user: &mut Self::User, cancel: &CancellationToken) -> Result<()>;

    /// Replace the stored user having the same id. No match is a silent no-op.
    async fn update(&self, user: &Self::User, cancel: &CancellationToken) -> Result<()>;

    /// Delete the stored user having the same id. No match is a silent no-op.
    async fn delete(&self, user: &Self::User, cancel: &CancellationToken) -> Result<()>;

    /// Look a user up by its external string identifier.
    async fn find_by_id(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::User>>;

    /// Look a user up by normalized user name.
    async fn find_by_name(
        &self,
        normalized_user_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::User>>;

    /// Dispose the store. Every later call fails with `ObjectDisposed`.
    fn dispose(&self);
}

/// Password-hash holder. The store never validates passwords.
pub trait UserPasswordStore: UserStore {
    /// Set the opaque password hash in memory.
    fn set_password_hash(
        &self,
        user: &mut Self::User,
        password_hash: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// The stored password hash, if any.
    fn password_hash(&self, user: &Self::User, cancel: &CancellationToken)
    -> Result<Option<String>>;

    /// Whether a non-empty password hash is present.
    fn has_password(&self, user: &Self::User, cancel: &CancellationToken) -> Result<bool>;
}

/// Email holder: value, confirmation flag, and lookup by normalized email.
#[async_trait]
pub trait UserEmailStore: UserStore {
    /// Set the email in memory.
    fn set_email(&self, user: &mut Self::User, email: &str, cancel: &CancellationToken)
    -> Result<()>;

    /// The user's email.
    fn email(&self, user: &Self::User, cancel: &CancellationToken) -> Result<Option<String>>;

    /// Whether the email has been confirmed.
    fn email_confirmed(&self, user: &Self::User, cancel: &CancellationToken) -> Result<bool>;

    /// Set the confirmation flag in memory.
    fn set_email_confirmed(
        &self,
        user: &mut Self::User,
        confirmed: bool,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// The framework-normalized email.
    fn normalized_email(
        &self,
        user: &Self::User,
        cancel: &CancellationToken,
    ) -> Result<Option<String>>;

    /// Set (or clear) the normalized email in memory.
    fn set_normalized_email(
        &self,
        user: &mut Self::User,
        normalized_email: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Look a user up by normalized email.
    async fn find_by_email(
        &self,
        normalized_email: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::User>>;
}

/// Role-assignment manager.
///
/// Role names are matched against the role's normalized name. Operations that
/// name a role fail with `RoleNotFound` when it does not exist.
#[async_trait]
pub trait UserRoleStore: UserStore {
    /// Record that the user holds the role.
    async fn add_to_role(
        &self,
        user: &Self::User,
        normalized_role_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Remove one membership of the user in the role, if any.
    async fn remove_from_role(
        &self,
        user: &Self::User,
        normalized_role_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Names of the roles the user holds. Order is unspecified.
    async fn roles(&self, user: &Self::User, cancel: &CancellationToken) -> Result<Vec<String>>;

    /// Whether the user holds the role.
    async fn is_in_role(
        &self,
        user: &Self::User,
        normalized_role_name: &str,
        cancel: &CancellationToken,
    ) -> Result<bool>;

    /// All users holding the role.
    async fn users_in_role(
        &self,
        normalized_role_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Self::User>>;
}

/// Role CRUD and lookup.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Role type declared by the embedding application.
    type Role: Send + Sync;

    /// Assign a new identifier to the role and insert it.
    async fn create(&self, role: &mut Self::Role, cancel: &CancellationToken) -> Result<()>;

    /// Replace the stored role having the same id. No match is a silent no-op.
    async fn update(&self, role: &Self::Role, cancel: &CancellationToken) -> Result<()>;

    /// Delete the stored role having the same id. No match is a silent no-op.
    async fn delete(&self, role: &Self::Role, cancel: &CancellationToken) -> Result<()>;

    /// The role's identifier in its external string form.
    fn role_id(&self, role: &Self::Role, cancel: &CancellationToken) -> Result<String>;

    /// The role's display name.
    fn role_name(&self, role: &Self::Role, cancel: &CancellationToken) -> Result<Option<String>>;

    /// Set the display name in memory.
    fn set_role_name(
        &self,
        role: &mut Self::Role,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// The framework-normalized role name.
    fn normalized_role_name(
        &self,
        role: &Self::Role,
        cancel: &CancellationToken,
    ) -> Result<Option<String>>;

    /// Set the normalized role name in memory.
    fn set_normalized_role_name(
        &self,
        role: &mut Self::Role,
        normalized_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Look a role up by its external string identifier.
    async fn find_by_id(
        &self,
        role_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::Role>>;

    /// Look a role up by normalized name. With several matches, any one wins.
    async fn find_by_name(
        &self,
        normalized_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::Role>>;

    /// Dispose the store. Every later call fails with `ObjectDisposed`.
    fn dispose(&self);
}

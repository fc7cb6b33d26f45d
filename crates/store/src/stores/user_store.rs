//! User store: user CRUD, password hash, email and role membership.
//!
//! Role membership spans three collections (`users`, `roles`, `user_roles`)
//! without a transaction. Every role-assignment operation first resolves the
//! role by normalized name and then reads or writes memberships; a role
//! deleted between the two steps can leave a dangling membership behind.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use docstore_identity_core::{
    DocumentCollection, DocumentDatabase, Filter, Result, RoleId, StoreError, UserEmailStore,
    UserId, UserPasswordStore, UserRoleStore, UserStore,
};

use super::{
    Lifecycle, ROLES_COLLECTION, USER_ROLES_COLLECTION, USERS_COLLECTION, cancellable,
    require_non_empty, require_role_name,
};
use crate::models::{IdentityRole, IdentityUser, MembershipRecord, decode, encode, fields};

/// Just the key of a role document.
#[derive(Deserialize)]
struct RoleKey {
    #[serde(rename = "_id")]
    id: RoleId,
}

/// User store backed by three document collections.
///
/// Generic over the user and role types declared by the embedding
/// application. Implements the identity-core, password, email and
/// role-assignment capabilities.
pub struct DocumentUserStore<U, R> {
    users: Arc<dyn DocumentCollection>,
    roles: Arc<dyn DocumentCollection>,
    user_roles: Arc<dyn DocumentCollection>,
    lifecycle: Lifecycle,
    _types: PhantomData<fn() -> (U, R)>,
}

impl<U: IdentityUser, R: IdentityRole> DocumentUserStore<U, R> {
    /// Create a user store over the given database.
    #[must_use]
    pub fn new(database: &dyn DocumentDatabase) -> Self {
        Self {
            users: database.collection(USERS_COLLECTION),
            roles: database.collection(ROLES_COLLECTION),
            user_roles: database.collection(USER_ROLES_COLLECTION),
            lifecycle: Lifecycle::new("DocumentUserStore"),
            _types: PhantomData,
        }
    }

    /// First match only; callers keep normalized names and emails unique.
    async fn find_first(&self, filter: &Filter, cancel: &CancellationToken) -> Result<Option<U>> {
        let documents = cancellable(cancel, self.users.find(filter)).await?;
        match documents.into_iter().next() {
            Some(document) => Ok(Some(decode(document)?)),
            None => Ok(None),
        }
    }

    /// Look the role up by normalized name; it must exist.
    async fn resolve_role(
        &self,
        normalized_role_name: &str,
        cancel: &CancellationToken,
    ) -> Result<RoleId> {
        let filter = Filter::equals(fields::NORMALIZED_NAME, normalized_role_name);
        let documents = cancellable(cancel, self.roles.find(&filter)).await?;

        let Some(document) = documents.into_iter().next() else {
            tracing::warn!(role = normalized_role_name, "role does not exist");
            return Err(StoreError::RoleNotFound(normalized_role_name.to_owned()));
        };

        let key: RoleKey = decode(document)?;
        Ok(key.id)
    }
}

/// The id of a user that has been created.
fn persisted_id<U: IdentityUser>(user: &U) -> Result<UserId> {
    user.identity()
        .id()
        .ok_or_else(|| StoreError::invalid_argument("user has not been created"))
}

/// Filter selecting the memberships of one user in one role.
fn membership_filter(user_id: UserId, role_id: RoleId) -> Filter {
    Filter::and(vec![
        Filter::equals(fields::USER_ID, user_id),
        Filter::equals(fields::ROLE_ID, role_id),
    ])
}

// =============================================================================
// Identity core
// =============================================================================

#[async_trait]
impl<U: IdentityUser, R: IdentityRole> UserStore for DocumentUserStore<U, R> {
    type User = U;

    fn user_id(&self, user: &U, cancel: &CancellationToken) -> Result<String> {
        self.lifecycle.ensure_active(cancel)?;
        Ok(persisted_id(user)?.to_string())
    }

    fn user_name(&self, user: &U, cancel: &CancellationToken) -> Result<Option<String>> {
        self.lifecycle.ensure_active(cancel)?;
        Ok(user.identity().user_name().map(str::to_owned))
    }

    fn set_user_name(&self, user: &mut U, user_name: &str, cancel: &CancellationToken) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        require_non_empty(user_name, "user name")?;
        user.identity_mut().user_name = Some(user_name.to_owned());
        Ok(())
    }

    fn normalized_user_name(&self, user: &U, cancel: &CancellationToken) -> Result<Option<String>> {
        self.lifecycle.ensure_active(cancel)?;
        Ok(user.identity().normalized_user_name().map(str::to_owned))
    }

    fn set_normalized_user_name(
        &self,
        user: &mut U,
        normalized_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        require_non_empty(normalized_name, "normalized user name")?;
        user.identity_mut().normalized_user_name = Some(normalized_name.to_owned());
        Ok(())
    }

    async fn create(&self, user: &mut U, cancel: &CancellationToken) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        if user.identity().id().is_some() {
            return Err(StoreError::invalid_argument("user has already been created"));
        }

        let id = UserId::generate();
        let mut document = encode(user)?;
        document.insert(fields::ID, id);

        cancellable(cancel, self.users.insert_one(document)).await?;
        user.identity_mut().assign_id(id);
        tracing::debug!(user_id = %id, "user created");
        Ok(())
    }

    async fn update(&self, user: &U, cancel: &CancellationToken) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        let id = persisted_id(user)?;
        let document = encode(user)?;

        let filter = Filter::equals(fields::ID, id);
        let matched = cancellable(cancel, self.users.replace_one(&filter, document)).await?;
        tracing::debug!(user_id = %id, matched, "user replaced");
        Ok(())
    }

    async fn delete(&self, user: &U, cancel: &CancellationToken) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        let id = persisted_id(user)?;

        let filter = Filter::equals(fields::ID, id);
        let deleted = cancellable(cancel, self.users.delete_one(&filter)).await?;
        tracing::debug!(user_id = %id, deleted, "user deleted");
        Ok(())
    }

    async fn find_by_id(&self, user_id: &str, cancel: &CancellationToken) -> Result<Option<U>> {
        self.lifecycle.ensure_active(cancel)?;
        let id = UserId::parse(user_id).map_err(|e| StoreError::invalid_argument(e.to_string()))?;
        self.find_first(&Filter::equals(fields::ID, id), cancel).await
    }

    async fn find_by_name(
        &self,
        normalized_user_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<U>> {
        self.lifecycle.ensure_active(cancel)?;
        self.find_first(
            &Filter::equals(fields::NORMALIZED_USER_NAME, normalized_user_name),
            cancel,
        )
        .await
    }

    fn dispose(&self) {
        self.lifecycle.dispose();
    }
}

// =============================================================================
// Password
// =============================================================================

impl<U: IdentityUser, R: IdentityRole> UserPasswordStore for DocumentUserStore<U, R> {
    fn set_password_hash(
        &self,
        user: &mut U,
        password_hash: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        require_non_empty(password_hash, "password hash")?;
        user.identity_mut().password_hash = Some(password_hash.to_owned());
        Ok(())
    }

    fn password_hash(&self, user: &U, cancel: &CancellationToken) -> Result<Option<String>> {
        self.lifecycle.ensure_active(cancel)?;
        Ok(user.identity().password_hash().map(str::to_owned))
    }

    fn has_password(&self, user: &U, cancel: &CancellationToken) -> Result<bool> {
        self.lifecycle.ensure_active(cancel)?;
        Ok(user.identity().password_hash().is_some_and(|hash| !hash.is_empty()))
    }
}

// =============================================================================
// Email
// =============================================================================

#[async_trait]
impl<U: IdentityUser, R: IdentityRole> UserEmailStore for DocumentUserStore<U, R> {
    fn set_email(&self, user: &mut U, email: &str, cancel: &CancellationToken) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        require_non_empty(email, "email")?;
        user.identity_mut().email = Some(email.to_owned());
        Ok(())
    }

    fn email(&self, user: &U, cancel: &CancellationToken) -> Result<Option<String>> {
        self.lifecycle.ensure_active(cancel)?;
        Ok(user.identity().email().map(str::to_owned))
    }

    fn email_confirmed(&self, user: &U, cancel: &CancellationToken) -> Result<bool> {
        self.lifecycle.ensure_active(cancel)?;
        Ok(user.identity().email_confirmed())
    }

    fn set_email_confirmed(
        &self,
        user: &mut U,
        confirmed: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        user.identity_mut().email_confirmed = confirmed;
        Ok(())
    }

    fn normalized_email(&self, user: &U, cancel: &CancellationToken) -> Result<Option<String>> {
        self.lifecycle.ensure_active(cancel)?;
        Ok(user.identity().normalized_email().map(str::to_owned))
    }

    fn set_normalized_email(
        &self,
        user: &mut U,
        normalized_email: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        user.identity_mut().normalized_email = normalized_email.map(str::to_owned);
        Ok(())
    }

    async fn find_by_email(
        &self,
        normalized_email: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<U>> {
        self.lifecycle.ensure_active(cancel)?;
        self.find_first(
            &Filter::equals(fields::NORMALIZED_EMAIL, normalized_email),
            cancel,
        )
        .await
    }
}

// =============================================================================
// Role membership
// =============================================================================

#[async_trait]
impl<U: IdentityUser, R: IdentityRole> UserRoleStore for DocumentUserStore<U, R> {
    async fn add_to_role(
        &self,
        user: &U,
        normalized_role_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        let user_id = persisted_id(user)?;
        require_role_name(normalized_role_name)?;

        let role_id = self.resolve_role(normalized_role_name, cancel).await?;
        let membership = MembershipRecord::new(user_id, role_id);
        let document = encode(&membership)?;

        cancellable(cancel, self.user_roles.insert_one(document)).await?;
        tracing::debug!(
            user_id = %user_id,
            role_id = %role_id,
            membership_id = %membership.id(),
            "membership added"
        );
        Ok(())
    }

    async fn remove_from_role(
        &self,
        user: &U,
        normalized_role_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        let user_id = persisted_id(user)?;
        require_role_name(normalized_role_name)?;

        let role_id = self.resolve_role(normalized_role_name, cancel).await?;
        let filter = membership_filter(user_id, role_id);
        let deleted = cancellable(cancel, self.user_roles.delete_one(&filter)).await?;
        tracing::debug!(user_id = %user_id, role_id = %role_id, deleted, "membership removed");
        Ok(())
    }

    async fn roles(&self, user: &U, cancel: &CancellationToken) -> Result<Vec<String>> {
        self.lifecycle.ensure_active(cancel)?;
        let user_id = persisted_id(user)?;

        let filter = Filter::equals(fields::USER_ID, user_id);
        let memberships = cancellable(cancel, self.user_roles.find(&filter)).await?;
        if memberships.is_empty() {
            return Ok(Vec::new());
        }

        let mut role_ids = Vec::with_capacity(memberships.len());
        for document in memberships {
            let membership: MembershipRecord = decode(document)?;
            role_ids.push(membership.role_id());
        }

        let filter = Filter::any_of(fields::ID, role_ids);
        let documents = cancellable(cancel, self.roles.find(&filter)).await?;

        let mut names = Vec::with_capacity(documents.len());
        for document in documents {
            let role: R = decode(document)?;
            if let Some(name) = role.identity().name() {
                names.push(name.to_owned());
            }
        }
        Ok(names)
    }

    async fn is_in_role(
        &self,
        user: &U,
        normalized_role_name: &str,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        self.lifecycle.ensure_active(cancel)?;
        let user_id = persisted_id(user)?;
        require_role_name(normalized_role_name)?;

        let role_id = self.resolve_role(normalized_role_name, cancel).await?;
        let filter = membership_filter(user_id, role_id);
        let count = cancellable(cancel, self.user_roles.count_documents(&filter)).await?;
        Ok(count > 0)
    }

    async fn users_in_role(
        &self,
        normalized_role_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<U>> {
        self.lifecycle.ensure_active(cancel)?;
        require_role_name(normalized_role_name)?;

        let role_id = self.resolve_role(normalized_role_name, cancel).await?;
        let filter = Filter::equals(fields::ROLE_ID, role_id);
        let memberships = cancellable(cancel, self.user_roles.find(&filter)).await?;
        if memberships.is_empty() {
            return Ok(Vec::new());
        }

        let mut user_ids = Vec::with_capacity(memberships.len());
        for document in memberships {
            let membership: MembershipRecord = decode(document)?;
            user_ids.push(membership.user_id());
        }

        let filter = Filter::any_of(fields::ID, user_ids);
        let documents = cancellable(cancel, self.users.find(&filter)).await?;
        documents
            .into_iter()
            .map(|document| decode(document).map_err(StoreError::from))
            .collect()
    }
}

//! Role store: CRUD and lookup for role records in the `roles` collection.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use docstore_identity_core::{
    DocumentCollection, DocumentDatabase, Filter, Result, RoleId, RoleStore, StoreError,
};

use super::{Lifecycle, ROLES_COLLECTION, cancellable, require_non_empty};
use crate::models::{IdentityRole, decode, encode, fields};

/// Role store backed by a document collection.
///
/// Generic over the role type declared by the embedding application.
pub struct DocumentRoleStore<R> {
    roles: Arc<dyn DocumentCollection>,
    lifecycle: Lifecycle,
    _role: PhantomData<fn() -> R>,
}

impl<R: IdentityRole> DocumentRoleStore<R> {
    /// Create a role store over the given database.
    #[must_use]
    pub fn new(database: &dyn DocumentDatabase) -> Self {
        Self {
            roles: database.collection(ROLES_COLLECTION),
            lifecycle: Lifecycle::new("DocumentRoleStore"),
            _role: PhantomData,
        }
    }

    /// First match only; callers keep normalized names unique.
    async fn find_first(&self, filter: &Filter, cancel: &CancellationToken) -> Result<Option<R>> {
        let documents = cancellable(cancel, self.roles.find(filter)).await?;
        match documents.into_iter().next() {
            Some(document) => Ok(Some(decode(document)?)),
            None => Ok(None),
        }
    }
}

/// The id of a role that has been created.
fn persisted_id<R: IdentityRole>(role: &R) -> Result<RoleId> {
    role.identity()
        .id()
        .ok_or_else(|| StoreError::invalid_argument("role has not been created"))
}

#[async_trait]
impl<R: IdentityRole> RoleStore for DocumentRoleStore<R> {
    type Role = R;

    async fn create(&self, role: &mut R, cancel: &CancellationToken) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        if role.identity().id().is_some() {
            return Err(StoreError::invalid_argument("role has already been created"));
        }

        let id = RoleId::generate();
        let mut document = encode(role)?;
        document.insert(fields::ID, id);

        cancellable(cancel, self.roles.insert_one(document)).await?;
        role.identity_mut().assign_id(id);
        tracing::debug!(role_id = %id, "role created");
        Ok(())
    }

    async fn update(&self, role: &R, cancel: &CancellationToken) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        let id = persisted_id(role)?;
        let document = encode(role)?;

        let filter = Filter::equals(fields::ID, id);
        let matched = cancellable(cancel, self.roles.replace_one(&filter, document)).await?;
        tracing::debug!(role_id = %id, matched, "role replaced");
        Ok(())
    }

    async fn delete(&self, role: &R, cancel: &CancellationToken) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        let id = persisted_id(role)?;

        let filter = Filter::equals(fields::ID, id);
        let deleted = cancellable(cancel, self.roles.delete_one(&filter)).await?;
        tracing::debug!(role_id = %id, deleted, "role deleted");
        Ok(())
    }

    fn role_id(&self, role: &R, cancel: &CancellationToken) -> Result<String> {
        self.lifecycle.ensure_active(cancel)?;
        Ok(persisted_id(role)?.to_string())
    }

    fn role_name(&self, role: &R, cancel: &CancellationToken) -> Result<Option<String>> {
        self.lifecycle.ensure_active(cancel)?;
        Ok(role.identity().name().map(str::to_owned))
    }

    fn set_role_name(&self, role: &mut R, name: &str, cancel: &CancellationToken) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        require_non_empty(name, "role name")?;
        role.identity_mut().name = Some(name.to_owned());
        Ok(())
    }

    fn normalized_role_name(&self, role: &R, cancel: &CancellationToken) -> Result<Option<String>> {
        self.lifecycle.ensure_active(cancel)?;
        Ok(role.identity().normalized_name().map(str::to_owned))
    }

    fn set_normalized_role_name(
        &self,
        role: &mut R,
        normalized_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.lifecycle.ensure_active(cancel)?;
        require_non_empty(normalized_name, "normalized role name")?;
        role.identity_mut().normalized_name = Some(normalized_name.to_owned());
        Ok(())
    }

    async fn find_by_id(&self, role_id: &str, cancel: &CancellationToken) -> Result<Option<R>> {
        self.lifecycle.ensure_active(cancel)?;

        // A string that is not a role id cannot match any stored role.
        let Ok(id) = RoleId::parse(role_id) else {
            tracing::debug!(role_id, "lookup with malformed role id");
            return Ok(None);
        };

        self.find_first(&Filter::equals(fields::ID, id), cancel).await
    }

    async fn find_by_name(
        &self,
        normalized_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<R>> {
        self.lifecycle.ensure_active(cancel)?;
        self.find_first(&Filter::equals(fields::NORMALIZED_NAME, normalized_name), cancel)
            .await
    }

    fn dispose(&self) {
        self.lifecycle.dispose();
    }
}

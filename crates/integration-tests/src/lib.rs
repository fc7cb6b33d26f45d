//! Integration tests for the document-store identity stores.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory gateway only
//! cargo test -p docstore-identity-integration-tests
//!
//! # Also run the MongoDB round trip
//! IDENTITY_TEST_MONGODB_URL=mongodb://localhost:27017 \
//!     cargo test -p docstore-identity-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `role_store` - Role CRUD and lookup
//! - `user_store` - User CRUD, password and email
//! - `role_membership` - Role assignment across the three collections
//! - `cancellation_disposal` - Entry checks and mid-flight cancellation
//! - `mongo_roundtrip` - The same flows against a live MongoDB

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use docstore_identity::{
    DocumentRoleStore, DocumentUserStore, IdentityStores, IdentityUser, MemoryCollection,
    MemoryDatabase, RoleRecord, RoleStore, UserRecord, UserStore,
};
use docstore_identity_core::{DocumentDatabase, Result};

/// A user type with one application-specific field on top of the identity
/// attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationUser {
    #[serde(flatten)]
    pub identity: UserRecord,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl ApplicationUser {
    #[must_use]
    pub fn new(user_name: &str, email: &str) -> Self {
        Self {
            identity: UserRecord::new(user_name, email),
            display_name: None,
        }
    }
}

impl IdentityUser for ApplicationUser {
    fn identity(&self) -> &UserRecord {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut UserRecord {
        &mut self.identity
    }
}

/// Stores over a fresh in-memory database.
pub struct TestContext {
    pub database: Arc<MemoryDatabase>,
    pub stores: IdentityStores<ApplicationUser, RoleRecord>,
    pub cancel: CancellationToken,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let database = Arc::new(MemoryDatabase::new());
        let shared: Arc<dyn DocumentDatabase> = database.clone();
        let stores = IdentityStores::new(shared);
        Self {
            database,
            stores,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn users(&self) -> DocumentUserStore<ApplicationUser, RoleRecord> {
        self.stores.user_store()
    }

    #[must_use]
    pub fn roles(&self) -> DocumentRoleStore<RoleRecord> {
        self.stores.role_store()
    }

    #[must_use]
    pub fn collection(&self, name: &str) -> Arc<MemoryCollection> {
        self.database.memory_collection(name)
    }

    /// Gateway calls made so far, across every collection.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.database.total_calls()
    }

    /// Create a role whose normalized name is the upper-cased name.
    pub async fn create_role(&self, name: &str) -> Result<RoleRecord> {
        let roles = self.roles();
        let mut role = RoleRecord::new(name);
        roles.set_normalized_role_name(&mut role, &name.to_uppercase(), &self.cancel)?;
        roles.create(&mut role, &self.cancel).await?;
        Ok(role)
    }

    /// Create a user whose normalized name is the upper-cased name.
    pub async fn create_user(&self, user_name: &str, email: &str) -> Result<ApplicationUser> {
        let users = self.users();
        let mut user = ApplicationUser::new(user_name, email);
        users.set_normalized_user_name(&mut user, &user_name.to_uppercase(), &self.cancel)?;
        users.create(&mut user, &self.cancel).await?;
        Ok(user)
    }
}

/// A token that has already fired.
#[must_use]
pub fn cancelled() -> CancellationToken {
    let token = CancellationToken::new();
    token.cancel();
    token
}

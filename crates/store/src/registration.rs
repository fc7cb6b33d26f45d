//! Store registration for the embedding application.

use std::marker::PhantomData;
use std::sync::Arc;

use docstore_identity_core::DocumentDatabase;
#[cfg(feature = "mongodb")]
use docstore_identity_core::GatewayError;

#[cfg(feature = "mongodb")]
use crate::config::IdentityConfig;
#[cfg(feature = "mongodb")]
use crate::gateway::MongoDatabase;
use crate::models::{IdentityRole, IdentityUser};
use crate::stores::{DocumentRoleStore, DocumentUserStore};

/// The user and role stores bound to one database and one pair of
/// application types.
///
/// Opened once at composition time; each logical session asks for its own
/// store instances, which share the underlying database handle.
pub struct IdentityStores<U, R> {
    database: Arc<dyn DocumentDatabase>,
    _types: PhantomData<fn() -> (U, R)>,
}

impl<U, R> Clone for IdentityStores<U, R> {
    fn clone(&self) -> Self {
        Self {
            database: Arc::clone(&self.database),
            _types: PhantomData,
        }
    }
}

impl<U: IdentityUser, R: IdentityRole> IdentityStores<U, R> {
    /// Register stores over an existing database.
    #[must_use]
    pub fn new(database: Arc<dyn DocumentDatabase>) -> Self {
        Self {
            database,
            _types: PhantomData,
        }
    }

    /// Connect to MongoDB and register stores over the configured database.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Connection` if the driver rejects the endpoint.
    #[cfg(feature = "mongodb")]
    pub async fn connect(config: &IdentityConfig) -> Result<Self, GatewayError> {
        let database = MongoDatabase::connect(config).await?;
        Ok(Self::new(Arc::new(database)))
    }

    /// A fresh user store.
    #[must_use]
    pub fn user_store(&self) -> DocumentUserStore<U, R> {
        DocumentUserStore::new(self.database.as_ref())
    }

    /// A fresh role store.
    #[must_use]
    pub fn role_store(&self) -> DocumentRoleStore<R> {
        DocumentRoleStore::new(self.database.as_ref())
    }

    /// The shared database handle.
    #[must_use]
    pub fn database(&self) -> &Arc<dyn DocumentDatabase> {
        &self.database
    }
}

//! MongoDB gateway.

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Client, Collection, Database};
use secrecy::ExposeSecret;

use docstore_identity_core::{Document, DocumentCollection, DocumentDatabase, Filter, GatewayError};

use crate::config::IdentityConfig;

fn backend(error: mongodb::error::Error) -> GatewayError {
    GatewayError::Backend(Box::new(error))
}

/// A MongoDB database.
///
/// Cheap to clone; the driver pools connections internally.
#[derive(Debug, Clone)]
pub struct MongoDatabase {
    database: Database,
}

impl MongoDatabase {
    /// Connect to the configured endpoint.
    ///
    /// The driver connects lazily, so an unreachable server surfaces on the
    /// first operation rather than here.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Connection` if the connection string is rejected.
    pub async fn connect(config: &IdentityConfig) -> Result<Self, GatewayError> {
        let client = Client::with_uri_str(config.endpoint.expose_secret())
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        tracing::info!(database = %config.database_name, "connected to MongoDB");
        Ok(Self::from_database(client.database(&config.database_name)))
    }

    /// Wrap an existing driver database handle.
    #[must_use]
    pub const fn from_database(database: Database) -> Self {
        Self { database }
    }
}

impl DocumentDatabase for MongoDatabase {
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        Arc::new(MongoCollection {
            inner: self.database.collection::<Document>(name),
        })
    }
}

struct MongoCollection {
    inner: Collection<Document>,
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn insert_one(&self, document: Document) -> Result<(), GatewayError> {
        self.inner.insert_one(document).await.map_err(backend)?;
        Ok(())
    }

    async fn replace_one(&self, filter: &Filter, document: Document) -> Result<u64, GatewayError> {
        let result = self
            .inner
            .replace_one(filter.to_document(), document)
            .await
            .map_err(backend)?;
        Ok(result.matched_count)
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, GatewayError> {
        let result = self
            .inner
            .delete_one(filter.to_document())
            .await
            .map_err(backend)?;
        Ok(result.deleted_count)
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, GatewayError> {
        let cursor = self.inner.find(filter.to_document()).await.map_err(backend)?;
        cursor.try_collect().await.map_err(backend)
    }

    async fn count_documents(&self, filter: &Filter) -> Result<u64, GatewayError> {
        self.inner
            .count_documents(filter.to_document())
            .await
            .map_err(backend)
    }
}

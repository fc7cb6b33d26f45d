//! In-memory document gateway.
//!
//! Collections keep documents in insertion order behind an async-aware
//! read-write lock and evaluate [`Filter`]s in process. Every operation bumps
//! a per-collection counter so tests can assert exactly which gateway calls a
//! store operation made.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::RwLock;

use docstore_identity_core::{Document, DocumentCollection, DocumentDatabase, Filter, GatewayError};

/// Snapshot of the calls made against a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub insert_one: usize,
    pub replace_one: usize,
    pub delete_one: usize,
    pub find: usize,
    pub count_documents: usize,
}

impl CallCounts {
    /// Total number of calls.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.insert_one + self.replace_one + self.delete_one + self.find + self.count_documents
    }
}

#[derive(Debug, Default)]
struct CallCounters {
    insert_one: AtomicUsize,
    replace_one: AtomicUsize,
    delete_one: AtomicUsize,
    find: AtomicUsize,
    count_documents: AtomicUsize,
}

/// In-memory collection.
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    documents: RwLock<Vec<Document>>,
    calls: CallCounters,
    failure: Mutex<Option<String>>,
}

impl MemoryCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(Vec::new()),
            calls: CallCounters::default(),
            failure: Mutex::new(None),
        }
    }

    /// Calls made so far.
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            insert_one: self.calls.insert_one.load(Ordering::Relaxed),
            replace_one: self.calls.replace_one.load(Ordering::Relaxed),
            delete_one: self.calls.delete_one.load(Ordering::Relaxed),
            find: self.calls.find.load(Ordering::Relaxed),
            count_documents: self.calls.count_documents.load(Ordering::Relaxed),
        }
    }

    /// Copy of the stored documents, in insertion order.
    pub async fn documents(&self) -> Vec<Document> {
        self.documents.read().await.clone()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the collection holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Make the next call fail with a connection error.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    fn record(&self, counter: &AtomicUsize) -> Result<(), GatewayError> {
        counter.fetch_add(1, Ordering::Relaxed);
        match self.failure.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(message) => Err(GatewayError::Connection(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, document: Document) -> Result<(), GatewayError> {
        self.record(&self.calls.insert_one)?;

        let mut documents = self.documents.write().await;
        if let Some(id) = document.get("_id")
            && documents.iter().any(|existing| existing.get("_id") == Some(id))
        {
            return Err(GatewayError::Backend(
                format!("duplicate key in {}: _id {id}", self.name).into(),
            ));
        }
        documents.push(document);
        Ok(())
    }

    async fn replace_one(&self, filter: &Filter, document: Document) -> Result<u64, GatewayError> {
        self.record(&self.calls.replace_one)?;

        let mut documents = self.documents.write().await;
        match documents.iter_mut().find(|existing| filter.matches(existing)) {
            Some(existing) => {
                *existing = document;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, GatewayError> {
        self.record(&self.calls.delete_one)?;

        let mut documents = self.documents.write().await;
        match documents.iter().position(|existing| filter.matches(existing)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, GatewayError> {
        self.record(&self.calls.find)?;

        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|document| filter.matches(document))
            .cloned()
            .collect())
    }

    async fn count_documents(&self, filter: &Filter) -> Result<u64, GatewayError> {
        self.record(&self.calls.count_documents)?;

        let documents = self.documents.read().await;
        let count = documents.iter().filter(|document| filter.matches(document)).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}

/// In-memory database handing out shared [`MemoryCollection`]s.
///
/// Asking twice for the same name returns the same collection.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    collections: Mutex<HashMap<String, Arc<MemoryCollection>>>,
}

impl MemoryDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The named collection, created on first use.
    #[must_use]
    pub fn memory_collection(&self, name: &str) -> Arc<MemoryCollection> {
        let mut collections = self.collections.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            collections
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(MemoryCollection::new(name))),
        )
    }

    /// Calls made against every collection so far.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|collection| collection.calls().total())
            .sum()
    }
}

impl DocumentDatabase for MemoryDatabase {
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        self.memory_collection(name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bson::doc;

    use super::*;

    #[tokio::test]
    async fn test_insert_and_find_in_order() {
        let collection = MemoryCollection::new("roles");
        collection.insert_one(doc! { "_id": "1", "normalizedName": "A" }).await.unwrap();
        collection.insert_one(doc! { "_id": "2", "normalizedName": "B" }).await.unwrap();
        collection.insert_one(doc! { "_id": "3", "normalizedName": "A" }).await.unwrap();

        let found = collection.find(&Filter::equals("normalizedName", "A")).await.unwrap();
        let ids: Vec<_> = found.iter().map(|d| d.get_str("_id").unwrap()).collect();
        assert_eq!(ids, ["1", "3"]);
        assert_eq!(collection.calls().insert_one, 3);
        assert_eq!(collection.calls().find, 1);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let collection = MemoryCollection::new("users");
        collection.insert_one(doc! { "_id": "1" }).await.unwrap();
        let err = collection.insert_one(doc! { "_id": "1" }).await.unwrap_err();
        assert!(matches!(err, GatewayError::Backend(_)));
        assert_eq!(collection.len().await, 1);
    }

    #[tokio::test]
    async fn test_replace_and_delete_touch_first_match_only() {
        let collection = MemoryCollection::new("user_roles");
        collection.insert_one(doc! { "_id": "1", "roleId": "r" }).await.unwrap();
        collection.insert_one(doc! { "_id": "2", "roleId": "r" }).await.unwrap();

        let matched = collection
            .replace_one(&Filter::equals("_id", "2"), doc! { "_id": "2", "roleId": "s" })
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let deleted = collection.delete_one(&Filter::equals("roleId", "r")).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(collection.documents().await, vec![doc! { "_id": "2", "roleId": "s" }]);

        let missing = collection
            .replace_one(&Filter::equals("_id", "9"), doc! { "_id": "9" })
            .await
            .unwrap();
        assert_eq!(missing, 0);
        assert_eq!(collection.delete_one(&Filter::equals("_id", "9")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_documents() {
        let collection = MemoryCollection::new("user_roles");
        collection.insert_one(doc! { "_id": "1", "userId": "u" }).await.unwrap();
        collection.insert_one(doc! { "_id": "2", "userId": "u" }).await.unwrap();
        assert_eq!(collection.count_documents(&Filter::equals("userId", "u")).await.unwrap(), 2);
        assert_eq!(collection.count_documents(&Filter::equals("userId", "v")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fail_next_fails_once() {
        let collection = MemoryCollection::new("roles");
        collection.fail_next("connection refused");

        let err = collection.find(&Filter::equals("_id", "1")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Connection(ref m) if m == "connection refused"));
        assert!(collection.find(&Filter::equals("_id", "1")).await.is_ok());
        assert_eq!(collection.calls().find, 2);
    }

    #[test]
    fn test_database_shares_collections() {
        let database = MemoryDatabase::new();
        let first = database.memory_collection("roles");
        let second = database.memory_collection("roles");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(database.collection("users").name(), "users");
        assert_eq!(database.total_calls(), 0);
    }
}

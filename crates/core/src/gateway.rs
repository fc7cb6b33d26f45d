//! Document-collection gateway contract.
//!
//! The stores never talk to a database driver directly. They go through a
//! [`DocumentDatabase`] that hands out named [`DocumentCollection`]s, each of
//! which supports the five operations the stores need: insert, replace,
//! delete, find and count, all addressed by a [`Filter`].
//!
//! Documents are BSON documents keyed by `_id`.

use std::sync::Arc;

use async_trait::async_trait;
use bson::Bson;
use thiserror::Error;

/// A stored document.
pub type Document = bson::Document;

/// Errors raised by a gateway implementation.
///
/// The stores propagate these unchanged; they never retry or reinterpret them.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backing store could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// A record could not be turned into a document.
    #[error("failed to encode document: {0}")]
    Encode(#[from] bson::ser::Error),

    /// A stored document could not be turned back into a record.
    #[error("failed to decode document: {0}")]
    Decode(#[from] bson::de::Error),

    /// Any other driver-level failure.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Predicate selecting documents in a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value.
    Eq(String, Bson),
    /// Field equals any of the values.
    In(String, Vec<Bson>),
    /// All of the nested filters match.
    And(Vec<Filter>),
}

impl Filter {
    /// Field equals the value.
    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    /// Field equals any of the values.
    #[must_use]
    pub fn any_of<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        Self::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// All of the filters match.
    #[must_use]
    pub const fn and(filters: Vec<Self>) -> Self {
        Self::And(filters)
    }

    /// Evaluate the filter against a document.
    ///
    /// Follows MongoDB equality: `Bson::Null` matches both an explicit null
    /// and a missing field.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::Eq(field, value) => field_equals(document, field, value),
            Self::In(field, values) => values
                .iter()
                .any(|value| field_equals(document, field, value)),
            Self::And(filters) => filters.iter().all(|f| f.matches(document)),
        }
    }

    /// Render the filter as a MongoDB query document.
    #[must_use]
    pub fn to_document(&self) -> Document {
        match self {
            Self::Eq(field, value) => {
                let mut doc = Document::new();
                doc.insert(field.clone(), value.clone());
                doc
            }
            Self::In(field, values) => {
                let mut condition = Document::new();
                condition.insert("$in", Bson::Array(values.clone()));
                let mut doc = Document::new();
                doc.insert(field.clone(), condition);
                doc
            }
            Self::And(filters) => {
                let clauses = filters
                    .iter()
                    .map(|f| Bson::Document(f.to_document()))
                    .collect();
                let mut doc = Document::new();
                doc.insert("$and", Bson::Array(clauses));
                doc
            }
        }
    }
}

fn field_equals(document: &Document, field: &str, value: &Bson) -> bool {
    match document.get(field) {
        Some(actual) => actual == value,
        None => *value == Bson::Null,
    }
}

/// A named collection of documents.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Name of the collection.
    fn name(&self) -> &str;

    /// Insert a document.
    async fn insert_one(&self, document: Document) -> Result<(), GatewayError>;

    /// Replace the first document matching the filter.
    ///
    /// Returns the number of matched documents (0 or 1). No match is not an error.
    async fn replace_one(&self, filter: &Filter, document: Document) -> Result<u64, GatewayError>;

    /// Delete the first document matching the filter.
    ///
    /// Returns the number of deleted documents (0 or 1). No match is not an error.
    async fn delete_one(&self, filter: &Filter) -> Result<u64, GatewayError>;

    /// All documents matching the filter, in the backing store's natural order.
    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, GatewayError>;

    /// Number of documents matching the filter.
    async fn count_documents(&self, filter: &Filter) -> Result<u64, GatewayError>;
}

/// A database handing out named collections.
pub trait DocumentDatabase: Send + Sync {
    /// Get a handle to the named collection.
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection>;
}

//! The minimal contract of a document database.
//!
//! Documents are JSON objects grouped in named collections and keyed by a
//! store-generated [`DocumentId`]. Every call is one round trip; there is no
//! transactional grouping.

use std::{cmp::Ordering, io, path::PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

use crate::domain::DocumentId;

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

/// Error returned by document and gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A file backing the store could not be read or written.
    #[error("I/O error at {}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// A value could not be encoded as a document.
    #[error("failed to encode document")]
    Json(#[from] serde_json::Error),
    /// A stored document does not have the expected shape.
    #[error("malformed document {collection}/{id}")]
    Corrupt {
        /// Collection of the document.
        collection: String,
        /// Id of the document.
        id: DocumentId,
        /// Why decoding failed.
        #[source]
        source: serde_json::Error,
    },
    /// The document to update does not exist.
    #[error("document {collection}/{id} not found")]
    NotFound {
        /// Collection of the document.
        collection: String,
        /// Id of the document.
        id: DocumentId,
    },
    /// An entity without an id was passed where a persisted one is needed.
    #[error("cannot write to {collection} without a document id")]
    MissingId {
        /// The collection that was targeted.
        collection: String,
    },
    /// A blocking storage task panicked or was cancelled.
    #[error("storage task failed")]
    Join(#[from] tokio::task::JoinError),
    /// The backend refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Sort direction of a [`Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// A collection read: an optional equality filter and an optional ordering.
///
/// When ordering is requested, documents without the ordering field are left
/// out, the way hosted document databases behave.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filter: Option<(String, Value)>,
    order_by: Option<(String, Direction)>,
}

impl Query {
    /// Every document of the collection, in store order.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Keeps only documents whose `field` equals `value`.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some((field.into(), value.into()));
        self
    }

    /// Sorts by `field`.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Evaluates the query over documents given in store order.
    ///
    /// The sort is stable, so ties keep store order.
    #[must_use]
    pub fn apply(&self, documents: Vec<(DocumentId, Document)>) -> Vec<(DocumentId, Document)> {
        let mut selected: Vec<_> = documents
            .into_iter()
            .filter(|(_, document)| self.matches(document))
            .collect();

        if let Some((field, direction)) = &self.order_by {
            selected.retain(|(_, document)| document.contains_key(field));
            selected.sort_by(|(_, a), (_, b)| {
                let ordering = compare_values(&a[field], &b[field]);
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        selected
    }

    fn matches(&self, document: &Document) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|(field, value)| document.get(field) == Some(value))
    }
}

/// Orders two JSON values of the same kind.
///
/// Strings that are both RFC 3339 timestamps compare chronologically;
/// values of different kinds compare equal.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => match (parse_timestamp(a), parse_timestamp(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a.cmp(b),
        },
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

/// The contract of the backing document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Adds a document and returns its generated id.
    async fn insert(&self, collection: &str, document: Document) -> Result<DocumentId, StoreError>;

    /// Reads one document, `None` if it does not exist.
    async fn get(&self, collection: &str, id: &DocumentId)
    -> Result<Option<Document>, StoreError>;

    /// Reads the documents matching `query`.
    async fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<(DocumentId, Document)>, StoreError>;

    /// Overwrites the given fields of an existing document.
    ///
    /// Fields not mentioned are kept.
    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Document,
    ) -> Result<(), StoreError>;

    /// Removes a document. Removing a missing document is not an error.
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError>;
}

//! Typed per-entity access to the document store.
//!
//! Each gateway maps one collection to its domain type. Writes are single
//! round trips: nothing here groups calls into a transaction, the services
//! sequence them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned, ser::Error as _};
use serde_json::Value;

use crate::{
    domain::{DocumentId, Status},
    storage::{Document, StoreError},
};

mod article;
pub use article::ArticleGateway;

mod category;
pub use category::CategoryGateway;

mod chapter;
pub use chapter::ChapterGateway;

mod news;
pub use news::NewsGateway;

fn to_document<R: Serialize>(record: &R) -> Result<Document, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(document) => Ok(document),
        other => Err(serde_json::Error::custom(format!("expected an object, found {other}")).into()),
    }
}

fn from_document<R: DeserializeOwned>(
    collection: &str,
    id: &DocumentId,
    document: Document,
) -> Result<R, StoreError> {
    serde_json::from_value(Value::Object(document)).map_err(|source| StoreError::Corrupt {
        collection: collection.to_string(),
        id: id.clone(),
        source,
    })
}

fn require_id<'a>(id: Option<&'a DocumentId>, collection: &str) -> Result<&'a DocumentId, StoreError> {
    id.ok_or_else(|| StoreError::MissingId {
        collection: collection.to_string(),
    })
}

/// The stored fields shared by news items and articles.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeadlineRecord {
    title: String,
    excerpt: String,
    update_date: DateTime<Utc>,
    #[serde(rename = "categoryID", default)]
    category_id: Option<DocumentId>,
    status: Status,
    creation_date: DateTime<Utc>,
    text: String,
}

impl HeadlineRecord {
    /// The fields an update overwrites: everything but the creation date,
    /// with a fresh update date.
    fn into_update(mut self) -> Result<Document, StoreError> {
        self.update_date = Utc::now();
        let mut document = to_document(&self)?;
        document.remove("creationDate");
        Ok(document)
    }
}

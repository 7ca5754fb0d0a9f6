use std::sync::Arc;

use chrono::Utc;

use super::{HeadlineRecord, from_document, require_id, to_document};
use crate::{
    domain::{DocumentId, News, NewsItem},
    storage::{Direction, Document, DocumentStore, Query, StoreError},
};

/// Reads and writes the `news-items` collection.
#[derive(Clone)]
pub struct NewsGateway {
    store: Arc<dyn DocumentStore>,
}

impl HeadlineRecord {
    fn from_news(news: &News) -> Self {
        Self {
            title: news.title.clone(),
            excerpt: news.excerpt.clone(),
            update_date: news.update_date,
            category_id: news.category.clone(),
            status: news.status,
            creation_date: news.creation_date,
            text: news.text.clone(),
        }
    }

    fn into_news(self, id: DocumentId) -> News {
        News {
            id: Some(id),
            title: self.title,
            excerpt: self.excerpt,
            update_date: self.update_date,
            category: self.category_id,
            status: self.status,
            creation_date: self.creation_date,
            text: self.text,
        }
    }
}

impl NewsGateway {
    /// The collection name.
    pub const COLLECTION: &'static str = "news-items";

    /// A gateway over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn decode(id: DocumentId, document: Document) -> Result<News, StoreError> {
        let record: HeadlineRecord = from_document(Self::COLLECTION, &id, document)?;
        Ok(record.into_news(id))
    }

    /// Persists a new news item, stamping both dates with the current time.
    ///
    /// # Errors
    ///
    /// Returns the store error if the insert fails.
    pub async fn create(&self, news: &News) -> Result<News, StoreError> {
        let now = Utc::now();
        let mut record = HeadlineRecord::from_news(news);
        record.creation_date = now;
        record.update_date = now;

        let id = self
            .store
            .insert(Self::COLLECTION, to_document(&record)?)
            .await?;
        tracing::debug!(%id, "Created news item");
        Ok(record.into_news(id))
    }

    /// Every news item, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns the store error if the query fails or a document is malformed.
    pub async fn read_all(&self) -> Result<Vec<NewsItem>, StoreError> {
        let query = Query::all().order_by("updateDate", Direction::Descending);
        let documents = self.store.query(Self::COLLECTION, &query).await?;
        let mut items = Vec::with_capacity(documents.len());
        for (id, document) in documents {
            if let Some(item) = Self::decode(id, document)?.item() {
                items.push(item);
            }
        }
        Ok(items)
    }

    /// The full news item with the given id, if any.
    ///
    /// # Errors
    ///
    /// Returns the store error if the read fails or the document is
    /// malformed.
    pub async fn read_by_id(&self, id: &DocumentId) -> Result<Option<News>, StoreError> {
        self.store
            .get(Self::COLLECTION, id)
            .await?
            .map(|document| Self::decode(id.clone(), document))
            .transpose()
    }

    /// Overwrites a persisted news item and refreshes its update date.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingId`] for an item without an id, or the
    /// store error.
    pub async fn update(&self, news: &News) -> Result<(), StoreError> {
        let id = require_id(news.id.as_ref(), Self::COLLECTION)?;
        let fields = HeadlineRecord::from_news(news).into_update()?;
        self.store.update(Self::COLLECTION, id, fields).await
    }

    /// Removes a news item.
    ///
    /// # Errors
    ///
    /// Returns the store error if the delete fails.
    pub async fn delete(&self, id: &DocumentId) -> Result<(), StoreError> {
        self.store.delete(Self::COLLECTION, id).await
    }

    /// Number of news items filed under `category`.
    ///
    /// # Errors
    ///
    /// Returns the store error if the query fails.
    pub async fn count_in_category(&self, category: &DocumentId) -> Result<usize, StoreError> {
        let query = Query::all().where_eq("categoryID", category.as_str());
        Ok(self.store.query(Self::COLLECTION, &query).await?.len())
    }
}

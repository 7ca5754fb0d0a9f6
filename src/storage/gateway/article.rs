use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{HeadlineRecord, from_document, require_id, to_document};
use crate::{
    domain::{Article, ArticleItem, DocumentId, Image},
    storage::{Direction, Document, DocumentStore, Query, StoreError},
};

/// An article is stored flat: the headline fields plus the cover URL.
#[derive(Debug, Serialize, Deserialize)]
struct ArticleRecord {
    #[serde(flatten)]
    headline: HeadlineRecord,
    #[serde(rename = "imageUrl")]
    image_url: String,
}

impl ArticleRecord {
    fn from_article(article: &Article) -> Self {
        Self {
            headline: HeadlineRecord {
                title: article.title.clone(),
                excerpt: article.excerpt.clone(),
                update_date: article.update_date,
                category_id: article.category.clone(),
                status: article.status,
                creation_date: article.creation_date,
                text: article.text.clone(),
            },
            image_url: article.image.url.clone(),
        }
    }

    /// The article without chapters; those live in their own collection.
    fn into_article(self, id: DocumentId) -> Article {
        let h = self.headline;
        Article {
            id: Some(id),
            title: h.title,
            excerpt: h.excerpt,
            update_date: h.update_date,
            category: h.category_id,
            status: h.status,
            creation_date: h.creation_date,
            text: h.text,
            image: Image::stored(self.image_url),
            ..Article::default()
        }
    }
}

/// Reads and writes the `articles` collection.
///
/// Chapters are not touched; see [`super::ChapterGateway`].
#[derive(Clone)]
pub struct ArticleGateway {
    store: Arc<dyn DocumentStore>,
}

impl ArticleGateway {
    /// The collection name.
    pub const COLLECTION: &'static str = "articles";

    /// A gateway over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn decode(id: DocumentId, document: Document) -> Result<Article, StoreError> {
        let record: ArticleRecord = from_document(Self::COLLECTION, &id, document)?;
        Ok(record.into_article(id))
    }

    /// Persists a new article record, stamping both dates.
    ///
    /// The cover must already be uploaded: only its URL is stored. The
    /// returned article has an empty chapter list.
    ///
    /// # Errors
    ///
    /// Returns the store error if the insert fails.
    pub async fn create(&self, article: &Article) -> Result<Article, StoreError> {
        let now = Utc::now();
        let mut record = ArticleRecord::from_article(article);
        record.headline.creation_date = now;
        record.headline.update_date = now;

        let id = self
            .store
            .insert(Self::COLLECTION, to_document(&record)?)
            .await?;
        tracing::debug!(%id, "Created article");
        Ok(record.into_article(id))
    }

    /// Every article, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns the store error if the query fails or a document is malformed.
    pub async fn read_all(&self) -> Result<Vec<ArticleItem>, StoreError> {
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

    /// The article record with the given id, without chapters.
    ///
    /// # Errors
    ///
    /// Returns the store error if the read fails or the document is
    /// malformed.
    pub async fn read_by_id(&self, id: &DocumentId) -> Result<Option<Article>, StoreError> {
        self.store
            .get(Self::COLLECTION, id)
            .await?
            .map(|document| Self::decode(id.clone(), document))
            .transpose()
    }

    /// Overwrites a persisted article record and refreshes its update date.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingId`] for an article without an id, or
    /// the store error.
    pub async fn update(&self, article: &Article) -> Result<(), StoreError> {
        let id = require_id(article.id.as_ref(), Self::COLLECTION)?;
        let record = ArticleRecord::from_article(article);
        let mut fields = record.headline.into_update()?;
        fields.insert("imageUrl".to_string(), Value::String(record.image_url));
        self.store.update(Self::COLLECTION, id, fields).await
    }

    /// Removes an article record.
    ///
    /// # Errors
    ///
    /// Returns the store error if the delete fails.
    pub async fn delete(&self, id: &DocumentId) -> Result<(), StoreError> {
        self.store.delete(Self::COLLECTION, id).await
    }

    /// Number of articles filed under `category`.
    ///
    /// # Errors
    ///
    /// Returns the store error if the query fails.
    pub async fn count_in_category(&self, category: &DocumentId) -> Result<usize, StoreError> {
        let query = Query::all().where_eq("categoryID", category.as_str());
        Ok(self.store.query(Self::COLLECTION, &query).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn draft() -> Article {
        Article {
            title: "The history of the harbour".to_string(),
            excerpt: "Four centuries of ships, storms and trade".to_string(),
            category: Some(DocumentId::new("history").unwrap()),
            text: "<p>Introduction</p>".to_string(),
            image: Image::stored("memory://blobs/images/articles/cover"),
            ..Article::default()
        }
    }

    #[tokio::test]
    async fn cover_url_is_stored_flat() {
        let store = Arc::new(MemoryStore::new());
        let gateway = ArticleGateway::new(store.clone());
        let created = gateway.create(&draft()).await.unwrap();
        let id = created.id.clone().unwrap();

        let raw = store
            .get(ArticleGateway::COLLECTION, &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw["imageUrl"], "memory://blobs/images/articles/cover");
        assert_eq!(raw["categoryID"], "history");

        let read = gateway.read_by_id(&id).await.unwrap().unwrap();
        assert_eq!(read.image, created.image);
        assert!(read.chapters.is_empty());
    }

    #[tokio::test]
    async fn update_replaces_the_cover_url() {
        let gateway = ArticleGateway::new(Arc::new(MemoryStore::new()));
        let mut article = gateway.create(&draft()).await.unwrap();
        article.image = Image::stored("memory://blobs/images/articles/other");
        gateway.update(&article).await.unwrap();

        let items = gateway.read_all().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].image.url, "memory://blobs/images/articles/other");
    }
}

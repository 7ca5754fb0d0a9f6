use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{from_document, require_id, to_document};
use crate::{
    domain::{Chapter, DocumentId, Image},
    storage::{Direction, Document, DocumentStore, Query, StoreError},
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChapterRecord {
    #[serde(default)]
    article_id: Option<DocumentId>,
    title: String,
    order: u32,
    show_title: bool,
    text: String,
    image_url: String,
    #[serde(default)]
    image_caption: String,
}

impl ChapterRecord {
    fn from_chapter(chapter: &Chapter) -> Self {
        Self {
            article_id: chapter.article.clone(),
            title: chapter.title.clone(),
            order: chapter.order,
            show_title: chapter.show_title,
            text: chapter.text.clone(),
            image_url: chapter.image.url.clone(),
            image_caption: chapter.image_caption.clone(),
        }
    }

    fn into_chapter(self, id: DocumentId) -> Chapter {
        Chapter {
            id: Some(id),
            article: self.article_id,
            title: self.title,
            order: self.order,
            show_title: self.show_title,
            text: self.text,
            image: Image::stored(self.image_url),
            image_caption: self.image_caption,
        }
    }
}

/// Reads and writes the `chapters` collection.
#[derive(Clone)]
pub struct ChapterGateway {
    store: Arc<dyn DocumentStore>,
}

impl ChapterGateway {
    /// The collection name.
    pub const COLLECTION: &'static str = "chapters";

    /// A gateway over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn decode(id: DocumentId, document: Document) -> Result<Chapter, StoreError> {
        let record: ChapterRecord = from_document(Self::COLLECTION, &id, document)?;
        Ok(record.into_chapter(id))
    }

    /// Persists a new chapter and returns it with its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingId`] if the chapter is not attached to
    /// an article, or the store error.
    pub async fn create(&self, chapter: &Chapter) -> Result<Chapter, StoreError> {
        require_id(chapter.article.as_ref(), Self::COLLECTION)?;
        let record = ChapterRecord::from_chapter(chapter);
        let id = self
            .store
            .insert(Self::COLLECTION, to_document(&record)?)
            .await?;
        Ok(record.into_chapter(id))
    }

    /// The chapters of an article, by order.
    ///
    /// # Errors
    ///
    /// Returns the store error if the query fails or a document is malformed.
    pub async fn read_by_article(&self, article: &DocumentId) -> Result<Vec<Chapter>, StoreError> {
        let query = Query::all()
            .where_eq("articleId", article.as_str())
            .order_by("order", Direction::Ascending);
        self.store
            .query(Self::COLLECTION, &query)
            .await?
            .into_iter()
            .map(|(id, document)| Self::decode(id, document))
            .collect()
    }

    /// The chapter with the given id, if any.
    ///
    /// # Errors
    ///
    /// Returns the store error if the read fails or the document is
    /// malformed.
    pub async fn read_by_id(&self, id: &DocumentId) -> Result<Option<Chapter>, StoreError> {
        self.store
            .get(Self::COLLECTION, id)
            .await?
            .map(|document| Self::decode(id.clone(), document))
            .transpose()
    }

    /// Overwrites the content of a persisted chapter.
    ///
    /// The owning article and the order are left as stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingId`] for a chapter without an id, or the
    /// store error.
    pub async fn update(&self, chapter: &Chapter) -> Result<(), StoreError> {
        let id = require_id(chapter.id.as_ref(), Self::COLLECTION)?;
        let mut fields = to_document(&ChapterRecord::from_chapter(chapter))?;
        fields.remove("articleId");
        fields.remove("order");
        self.store.update(Self::COLLECTION, id, fields).await
    }

    /// Removes a chapter.
    ///
    /// # Errors
    ///
    /// Returns the store error if the delete fails.
    pub async fn delete(&self, id: &DocumentId) -> Result<(), StoreError> {
        self.store.delete(Self::COLLECTION, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn chapter(article: &str, order: u32) -> Chapter {
        Chapter {
            article: Some(DocumentId::new(article).unwrap()),
            order,
            ..Chapter::new(format!("Chapter {order}"), "<p>text</p>")
        }
    }

    #[tokio::test]
    async fn chapters_are_scoped_and_ordered() {
        let gateway = ChapterGateway::new(Arc::new(MemoryStore::new()));
        for (article, order) in [("a", 2), ("b", 1), ("a", 1), ("a", 3)] {
            gateway.create(&chapter(article, order)).await.unwrap();
        }

        let a = DocumentId::new("a").unwrap();
        let orders: Vec<_> = gateway
            .read_by_article(&a)
            .await
            .unwrap()
            .iter()
            .map(|c| c.order)
            .collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn detached_chapters_are_refused() {
        let gateway = ChapterGateway::new(Arc::new(MemoryStore::new()));
        let error = gateway
            .create(&Chapter::new("Loose", "text"))
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::MissingId { .. }));
    }

    #[tokio::test]
    async fn update_leaves_article_and_order_alone() {
        let gateway = ChapterGateway::new(Arc::new(MemoryStore::new()));
        let mut saved = gateway.create(&chapter("a", 1)).await.unwrap();
        saved.title = "Renamed".to_string();
        saved.order = 7;
        saved.article = None;
        gateway.update(&saved).await.unwrap();

        let read = gateway
            .read_by_id(saved.id.as_ref().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.title, "Renamed");
        assert_eq!(read.order, 1);
        assert_eq!(read.article.as_deref(), Some("a"));
    }
}

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{from_document, require_id, to_document};
use crate::{
    domain::{Category, DocumentId},
    storage::{Direction, Document, DocumentStore, Query, StoreError},
};

#[derive(Debug, Serialize, Deserialize)]
struct CategoryRecord {
    name: String,
}

/// Reads and writes the `categories` collection.
#[derive(Clone)]
pub struct CategoryGateway {
    store: Arc<dyn DocumentStore>,
}

impl CategoryGateway {
    /// The collection name.
    pub const COLLECTION: &'static str = "categories";

    /// A gateway over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn decode(id: DocumentId, document: Document) -> Result<Category, StoreError> {
        let record: CategoryRecord = from_document(Self::COLLECTION, &id, document)?;
        Ok(Category {
            id: Some(id),
            name: record.name,
        })
    }

    /// Persists a new category and returns it with its id.
    ///
    /// # Errors
    ///
    /// Returns the store error if the insert fails.
    pub async fn create(&self, category: &Category) -> Result<Category, StoreError> {
        let record = CategoryRecord {
            name: category.name.clone(),
        };
        let id = self
            .store
            .insert(Self::COLLECTION, to_document(&record)?)
            .await?;
        Ok(Category {
            id: Some(id),
            name: record.name,
        })
    }

    /// Every category, by name.
    ///
    /// # Errors
    ///
    /// Returns the store error if the query fails or a document is malformed.
    pub async fn read_all(&self) -> Result<Vec<Category>, StoreError> {
        let query = Query::all().order_by("name", Direction::Ascending);
        self.store
            .query(Self::COLLECTION, &query)
            .await?
            .into_iter()
            .map(|(id, document)| Self::decode(id, document))
            .collect()
    }

    /// The category with the given id, if any.
    ///
    /// # Errors
    ///
    /// Returns the store error if the read fails or the document is
    /// malformed.
    pub async fn read_by_id(&self, id: &DocumentId) -> Result<Option<Category>, StoreError> {
        self.store
            .get(Self::COLLECTION, id)
            .await?
            .map(|document| Self::decode(id.clone(), document))
            .transpose()
    }

    /// Overwrites the name of a persisted category.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingId`] for a category without an id, or
    /// the store error.
    pub async fn update(&self, category: &Category) -> Result<(), StoreError> {
        let id = require_id(category.id.as_ref(), Self::COLLECTION)?;
        let record = CategoryRecord {
            name: category.name.clone(),
        };
        self.store
            .update(Self::COLLECTION, id, to_document(&record)?)
            .await
    }

    /// Removes a category.
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

    #[tokio::test]
    async fn categories_are_listed_by_name() {
        let gateway = CategoryGateway::new(Arc::new(MemoryStore::new()));
        for name in ["Sports", "Culture", "Economy"] {
            gateway.create(&Category::new(name)).await.unwrap();
        }

        let names: Vec<_> = gateway
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Culture", "Economy", "Sports"]);
    }

    #[tokio::test]
    async fn update_requires_an_id() {
        let gateway = CategoryGateway::new(Arc::new(MemoryStore::new()));
        let error = gateway.update(&Category::new("Sports")).await.unwrap_err();
        assert!(matches!(error, StoreError::MissingId { .. }));
    }

    #[tokio::test]
    async fn renamed_category_reads_back() {
        let gateway = CategoryGateway::new(Arc::new(MemoryStore::new()));
        let mut category = gateway.create(&Category::new("Sprots")).await.unwrap();
        category.name = "Sports".to_string();
        gateway.update(&category).await.unwrap();

        let id = category.id.clone().unwrap();
        assert_eq!(gateway.read_by_id(&id).await.unwrap(), Some(category));

        gateway.delete(&id).await.unwrap();
        assert_eq!(gateway.read_by_id(&id).await.unwrap(), None);
    }
}

//! In-memory store implementations for tests and demos.
//!
//! Both stores count their writes and can be told to fail, so callers can
//! observe which round trips a workflow issued.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::DocumentId,
    storage::{
        BlobError, BlobPath, BlobStore, Document, DocumentStore, Query, StoreError,
    },
};

/// A [`DocumentStore`] kept in memory.
///
/// Collections keep insertion order, which is the store order seen by
/// queries without an ordering.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<(DocumentId, Document)>>>,
    unavailable: Mutex<HashSet<String>>,
    read_delays: Mutex<BTreeMap<DocumentId, Duration>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call on `collection` fail with
    /// [`StoreError::Unavailable`], or stops doing so.
    pub async fn set_unavailable(&self, collection: &str, unavailable: bool) {
        let mut set = self.unavailable.lock().await;
        if unavailable {
            set.insert(collection.to_string());
        } else {
            set.remove(collection);
        }
    }

    /// Delays every `get` of the document `id` by `delay`.
    pub async fn set_read_delay(&self, id: &DocumentId, delay: Duration) {
        self.read_delays.lock().await.insert(id.clone(), delay);
    }

    /// Number of insert, update and delete calls received so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    async fn check(&self, collection: &str) -> Result<(), StoreError> {
        if self.unavailable.lock().await.contains(collection) {
            return Err(StoreError::Unavailable(format!(
                "collection {collection} is offline"
            )));
        }
        Ok(())
    }

    async fn check_write(&self, collection: &str) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check(collection).await
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, document: Document) -> Result<DocumentId, StoreError> {
        self.check_write(collection).await?;
        let id = DocumentId::generate();
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), document));
        Ok(id)
    }

    async fn get(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Document>, StoreError> {
        self.check(collection).await?;
        let delay = self.read_delays.lock().await.get(id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .collections
            .lock()
            .await
            .get(collection)
            .and_then(|documents| documents.iter().find(|(key, _)| key == id))
            .map(|(_, document)| document.clone()))
    }

    async fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<(DocumentId, Document)>, StoreError> {
        self.check(collection).await?;
        let documents = self
            .collections
            .lock()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default();
        Ok(query.apply(documents))
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.check_write(collection).await?;
        let mut collections = self.collections.lock().await;
        let document = collections
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|(key, _)| key == id))
            .map(|(_, document)| document)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.clone(),
            })?;
        document.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        self.check_write(collection).await?;
        if let Some(documents) = self.collections.lock().await.get_mut(collection) {
            documents.retain(|(key, _)| key != id);
        }
        Ok(())
    }
}

/// A [`BlobStore`] kept in memory.
#[derive(Debug)]
pub struct MemoryBlobStore {
    base_url: String,
    blobs: Mutex<BTreeMap<BlobPath, (String, Vec<u8>)>>,
    failing: AtomicBool,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://blobs")
    }
}

impl MemoryBlobStore {
    /// An empty store handing out URLs under `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            blobs: Mutex::default(),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every call fail with [`BlobError::Unavailable`], or stops
    /// doing so.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.failing.store(unavailable, Ordering::SeqCst);
    }

    /// Every stored path, sorted.
    pub async fn paths(&self) -> Vec<String> {
        self.blobs
            .lock()
            .await
            .keys()
            .map(|path| path.as_str().to_string())
            .collect()
    }

    /// Whether a blob is stored at the given path or URL.
    pub async fn contains(&self, path_or_url: &str) -> bool {
        match BlobPath::from_url(&self.base_url, path_or_url) {
            Ok(path) => self.blobs.lock().await.contains_key(&path),
            Err(_) => false,
        }
    }

    fn check(&self) -> Result<(), BlobError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BlobError::Unavailable("blob store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        path: &BlobPath,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, BlobError> {
        self.check()?;
        self.blobs
            .lock()
            .await
            .insert(path.clone(), (content_type.to_string(), bytes.to_vec()));
        Ok(path.url(&self.base_url))
    }

    async fn delete(&self, path_or_url: &str) -> Result<(), BlobError> {
        self.check()?;
        let path = BlobPath::from_url(&self.base_url, path_or_url)?;
        self.blobs
            .lock()
            .await
            .remove(&path)
            .map(|_| ())
            .ok_or_else(|| BlobError::NotFound(path.to_string()))
    }
}

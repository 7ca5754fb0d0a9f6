//! Filesystem backed stores.
//!
//! The [`DirectoryStore`] keeps one pretty-printed JSON file per document at
//! `root/<collection>/<id>.json`. The [`DirectoryBlobStore`] keeps one file
//! per blob at `root/<path>`.

use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::{
    domain::DocumentId,
    storage::{BlobError, BlobPath, BlobStore, Document, DocumentStore, Query, StoreError},
};

/// A document store kept in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    /// The root of the directory documents are stored in.
    root: PathBuf,
}

impl DirectoryStore {
    /// Opens a store at the given path. Nothing is created until the first
    /// write.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file of a document, or `None` for ids that cannot be file names.
    fn document_path(&self, collection: &str, id: &DocumentId) -> Option<PathBuf> {
        let usable = !id.contains(['/', '\\']) && !id.starts_with('.');
        usable.then(|| self.root.join(collection).join(format!("{id}.json")))
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn decode(collection: &str, id: &DocumentId, bytes: &[u8]) -> Result<Document, StoreError> {
    serde_json::from_slice(bytes).map_err(|source| StoreError::Corrupt {
        collection: collection.to_string(),
        id: id.clone(),
        source,
    })
}

async fn read_document(
    path: &Path,
    collection: &str,
    id: &DocumentId,
) -> Result<Option<Document>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => decode(collection, id, &bytes).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path)(e)),
    }
}

async fn write_document(path: &Path, document: &Document) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(io_error(parent))?;
    }
    let bytes = serde_json::to_vec_pretty(document)?;
    tokio::fs::write(path, bytes).await.map_err(io_error(path))
}

/// The JSON files directly inside a collection directory, by file name.
///
/// A collection that was never written to has no directory and is empty.
fn collect_document_paths(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 && is_not_found(&e) => return Ok(Vec::new()),
            Err(e) => {
                let path = e.path().unwrap_or(dir).to_path_buf();
                return Err(StoreError::Io {
                    path,
                    source: e.into(),
                });
            }
        };
        if entry.file_type().is_file() && entry.path().extension() == Some(OsStr::new("json")) {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

fn is_not_found(error: &walkdir::Error) -> bool {
    error
        .io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

fn load_collection(
    dir: &Path,
    collection: &str,
) -> Result<Vec<(DocumentId, Document)>, StoreError> {
    let mut documents = Vec::new();
    for path in collect_document_paths(dir)? {
        let Some(id) = path
            .file_stem()
            .and_then(OsStr::to_str)
            .and_then(|stem| DocumentId::new(stem).ok())
        else {
            tracing::debug!("Skipping unrecognised file {}", path.display());
            continue;
        };
        let bytes = std::fs::read(&path).map_err(io_error(&path))?;
        documents.push((id.clone(), decode(collection, &id, &bytes)?));
    }
    Ok(documents)
}

#[async_trait]
impl DocumentStore for DirectoryStore {
    async fn insert(&self, collection: &str, document: Document) -> Result<DocumentId, StoreError> {
        let id = DocumentId::generate();
        let path = self.root.join(collection).join(format!("{id}.json"));
        write_document(&path, &document).await?;
        tracing::debug!("Wrote {}", path.display());
        Ok(id)
    }

    async fn get(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Document>, StoreError> {
        match self.document_path(collection, id) {
            Some(path) => read_document(&path, collection, id).await,
            None => Ok(None),
        }
    }

    async fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<(DocumentId, Document)>, StoreError> {
        let dir = self.root.join(collection);
        let name = collection.to_string();
        let documents =
            tokio::task::spawn_blocking(move || load_collection(&dir, &name)).await??;
        tracing::debug!(collection, count = documents.len(), "Loaded collection");
        Ok(query.apply(documents))
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Document,
    ) -> Result<(), StoreError> {
        let not_found = || StoreError::NotFound {
            collection: collection.to_string(),
            id: id.clone(),
        };
        let path = self.document_path(collection, id).ok_or_else(not_found)?;
        let mut document = read_document(&path, collection, id)
            .await?
            .ok_or_else(not_found)?;
        document.extend(fields);
        write_document(&path, &document).await
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        let Some(path) = self.document_path(collection, id) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path)(e)),
        }
    }
}

/// A blob store kept in a directory.
///
/// Only the bytes are kept; the content type is not stored.
#[derive(Debug, Clone)]
pub struct DirectoryBlobStore {
    root: PathBuf,
    base_url: String,
}

impl DirectoryBlobStore {
    /// Opens a store at `root` handing out URLs under `base_url`.
    #[must_use]
    pub fn new(root: PathBuf, base_url: impl Into<String>) -> Self {
        Self {
            root,
            base_url: base_url.into(),
        }
    }

    fn file(&self, path: &BlobPath) -> PathBuf {
        path.as_str()
            .split('/')
            .fold(self.root.clone(), |file, segment| file.join(segment))
    }
}

fn blob_io_error(path: &BlobPath) -> impl FnOnce(io::Error) -> BlobError + '_ {
    move |source| BlobError::Io {
        path: path.to_string(),
        source,
    }
}

#[async_trait]
impl BlobStore for DirectoryBlobStore {
    async fn upload(
        &self,
        path: &BlobPath,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, BlobError> {
        let file = self.file(path);
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(blob_io_error(path))?;
        }
        tokio::fs::write(&file, bytes)
            .await
            .map_err(blob_io_error(path))?;
        tracing::debug!(%path, content_type, len = bytes.len(), "Stored blob");
        Ok(path.url(&self.base_url))
    }

    async fn delete(&self, path_or_url: &str) -> Result<(), BlobError> {
        let path = BlobPath::from_url(&self.base_url, path_or_url)?;
        match tokio::fs::remove_file(self.file(&path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(path.to_string()))
            }
            Err(e) => Err(blob_io_error(&path)(e)),
        }
    }
}

//! Persistence: the document and blob store contracts, their in-memory and
//! filesystem backends, and the per-entity gateways built on top.

mod blob;
pub use blob::{BlobError, BlobPath, BlobStore};

mod directory;
pub use directory::{DirectoryBlobStore, DirectoryStore};

mod document;
pub use document::{Direction, Document, DocumentStore, Query, StoreError};

mod gateway;
pub use gateway::{ArticleGateway, CategoryGateway, ChapterGateway, NewsGateway};

mod memory;
pub use memory::{MemoryBlobStore, MemoryStore};

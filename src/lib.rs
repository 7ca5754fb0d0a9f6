//! Content management for news items and chaptered articles
//!
//! Categories, news items and articles are documents in a document store;
//! article covers and chapter images are blobs. Editors work on validated
//! drafts, and the services persist them and keep list and detail state.

pub mod app;
pub use app::App;

pub mod domain;
pub use domain::{
    Article, ArticleItem, Category, Chapter, Config, DocumentId, Image, News, NewsItem, Status,
};

pub mod editor;
pub use editor::{ChapterList, Form};

pub mod logging;

pub mod notify;
pub use notify::{Level, Notification, NotificationLog, Notifier};

pub mod routes;
pub use routes::Route;

pub mod service;
pub use service::{
    ArticleService, CategoryService, ListState, NewsService, ServiceError,
};

pub mod storage;
pub use storage::{BlobStore, DocumentStore, StoreError};

pub mod validation;
pub use validation::{Report, Validate};

pub mod view;

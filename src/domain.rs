//! Domain models for news items and articles.
//!
//! This module contains the entities the CMS manages, their identifiers and
//! status tags, and the application configuration.

mod article;
pub use article::{Article, ArticleItem};

mod category;
pub use category::Category;

mod chapter;
pub use chapter::Chapter;

mod config;
pub use config::{Config, ConfigError};

mod id;
pub use id::{DocumentId, EmptyIdError};

mod image;
pub use image::{Image, ImageFile};

mod news;
pub use news::{News, NewsItem};

/// Helpers for rich-text (HTML) content.
pub mod rich_text;

mod status;
pub use status::{EntryStatus, Status, UnknownStatusError};

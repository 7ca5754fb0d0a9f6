//! Assembly of stores and services.

use std::{path::Path, sync::Arc};

use anyhow::Context;
use futures::future::join3;

use crate::{
    domain::Config,
    logging,
    notify::NotificationLog,
    service::{ArticleService, CategoryService, ChapterService, NewsService, ServiceError},
    storage::{
        ArticleGateway, BlobStore, CategoryGateway, ChapterGateway, DirectoryBlobStore,
        DirectoryStore, DocumentStore, MemoryBlobStore, MemoryStore, NewsGateway,
    },
    view::{ArticleOverview, HomePage, NewsOverview},
};

/// The services of one newsdesk instance, sharing their stores and their
/// notification log.
pub struct App {
    config: Config,
    notifications: Arc<NotificationLog>,
    categories: CategoryService,
    news: NewsService,
    articles: ArticleService,
}

impl App {
    /// Reads a configuration file. Relative store directories are taken
    /// relative to the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_config(path: &Path) -> anyhow::Result<Config> {
        let config = Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        Ok(match path.parent() {
            Some(base) => config.relative_to(base),
            None => config,
        })
    }

    /// Opens the directory stores named in `config`, creating them if
    /// needed, and installs the log subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if a store directory cannot be created.
    pub async fn open(config: Config) -> anyhow::Result<Self> {
        logging::init(&config.log_level);

        for dir in [&config.data_dir, &config.blob_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create store directory {}", dir.display()))?;
        }
        tracing::info!(
            data_dir = %config.data_dir.display(),
            blob_dir = %config.blob_dir.display(),
            "Opened stores"
        );

        let documents = Arc::new(DirectoryStore::new(config.data_dir.clone()));
        let blobs = Arc::new(DirectoryBlobStore::new(
            config.blob_dir.clone(),
            config.blob_base_url.clone(),
        ));
        Ok(Self::with_stores(config, documents, blobs))
    }

    /// An instance backed by fresh in-memory stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_stores(
            Config::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryBlobStore::default()),
        )
    }

    /// Wires the services onto the given stores.
    #[must_use]
    pub fn with_stores(
        config: Config,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let notifications = Arc::new(NotificationLog::new(config.notification_timeout_ms()));

        let news_gateway = NewsGateway::new(documents.clone());
        let article_gateway = ArticleGateway::new(documents.clone());

        let categories = CategoryService::new(
            CategoryGateway::new(documents.clone()),
            news_gateway.clone(),
            article_gateway.clone(),
            notifications.clone(),
        );
        let news = NewsService::new(news_gateway, notifications.clone());
        let chapters = ChapterService::new(ChapterGateway::new(documents), blobs.clone());
        let articles =
            ArticleService::new(article_gateway, chapters, blobs, notifications.clone());

        Self {
            config,
            notifications,
            categories,
            news,
            articles,
        }
    }

    /// Loads every list. All three loads run even if one fails; the first
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first service error; the user is notified of each.
    pub async fn load(&self) -> Result<(), ServiceError> {
        let (categories, news, articles) =
            join3(self.categories.load(), self.news.load(), self.articles.load()).await;
        categories.and(news).and(articles)
    }

    /// The configuration the instance was built from.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Notifications waiting to be shown.
    #[must_use]
    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    /// The category service.
    #[must_use]
    pub const fn categories(&self) -> &CategoryService {
        &self.categories
    }

    /// The news service.
    #[must_use]
    pub const fn news(&self) -> &NewsService {
        &self.news
    }

    /// The article service.
    #[must_use]
    pub const fn articles(&self) -> &ArticleService {
        &self.articles
    }

    /// The public news overview from the loaded lists.
    #[must_use]
    pub fn news_overview(&self) -> NewsOverview {
        NewsOverview::build(
            &self.categories.state().items,
            &self.news.state().items,
        )
    }

    /// The public article overview from the loaded lists.
    #[must_use]
    pub fn article_overview(&self) -> ArticleOverview {
        ArticleOverview::build(
            &self.categories.state().items,
            &self.articles.state().items,
        )
    }

    /// The home page with at most `limit` entries per list.
    #[must_use]
    pub fn home(&self, limit: usize) -> HomePage {
        HomePage::build(
            &self.news.state().items,
            &self.articles.state().items,
            limit,
        )
    }
}

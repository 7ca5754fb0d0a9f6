use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use super::{ListState, ServiceError, StateCell, report};
use crate::{
    domain::{Category, DocumentId},
    notify::{Notifier, Operation},
    storage::{ArticleGateway, CategoryGateway, NewsGateway},
};

const SUBJECT: &str = "the category";

/// Owns the category list and the selected category.
///
/// Categories are small, so the detail is taken from the list instead of a
/// separate read.
pub struct CategoryService {
    gateway: CategoryGateway,
    news: NewsGateway,
    articles: ArticleGateway,
    notifier: Arc<dyn Notifier>,
    state: StateCell<Category, Category>,
}

impl CategoryService {
    /// A service with an empty state; call [`CategoryService::load`] to
    /// fill it.
    ///
    /// The news and article gateways are used to find references before a
    /// delete.
    #[must_use]
    pub fn new(
        gateway: CategoryGateway,
        news: NewsGateway,
        articles: ArticleGateway,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            gateway,
            news,
            articles,
            notifier,
            state: StateCell::new(),
        }
    }

    /// Follows every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListState<Category, Category>> {
        self.state.subscribe()
    }

    /// A copy of the current state.
    #[must_use]
    pub fn state(&self) -> ListState<Category, Category> {
        self.state.snapshot()
    }

    /// Reads the list, by name; selects the first category if nothing is
    /// selected.
    ///
    /// # Errors
    ///
    /// Returns the store error; the user is notified.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), ServiceError> {
        self.refresh().await?;
        if self.state.selected_id().is_none() {
            self.select_first();
        }
        Ok(())
    }

    async fn refresh(&self) -> Result<(), ServiceError> {
        let result = self.gateway.read_all().await.map_err(ServiceError::from);
        let items = report(self.notifier.as_ref(), Operation::Load, SUBJECT, result)?;
        tracing::debug!(count = items.len(), "Loaded categories");
        self.state.set_items(items);
        Ok(())
    }

    fn select_first(&self) {
        match self.state.with(|s| s.items.first().and_then(|c| c.id.clone())) {
            Some(id) => self.select(&id),
            None => self.state.clear_selection(),
        }
    }

    /// Selects a category from the list. An id that is not listed selects
    /// nothing.
    pub fn select(&self, id: &DocumentId) {
        let found = self
            .state
            .with(|s| s.items.iter().find(|c| c.id.as_ref() == Some(id)).cloned());
        self.state.select_now(id, found);
    }

    /// Drops the selection.
    pub fn clear_selection(&self) {
        self.state.clear_selection();
    }

    /// Persists a new category and selects it.
    ///
    /// # Errors
    ///
    /// Returns the store error; the user is notified.
    #[instrument(skip_all, fields(name = %category.name))]
    pub async fn create(&self, category: &Category) -> Result<Category, ServiceError> {
        let result = self.gateway.create(category).await.map_err(ServiceError::from);
        let created = report(self.notifier.as_ref(), Operation::Creation, SUBJECT, result)?;
        tracing::info!(id = ?created.id, "Created category");

        self.refresh().await?;
        if let Some(id) = &created.id {
            self.select(id);
        }
        Ok(created)
    }

    /// Persists a renamed category.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingId`] for a draft that was never
    /// created, or the store error; the user is notified.
    #[instrument(skip_all, fields(id = ?category.id))]
    pub async fn update(&self, category: &Category) -> Result<(), ServiceError> {
        let result = match &category.id {
            Some(_) => self.gateway.update(category).await.map_err(ServiceError::from),
            None => Err(ServiceError::MissingId("category")),
        };
        report(self.notifier.as_ref(), Operation::Update, SUBJECT, result)?;
        tracing::info!("Updated category");

        self.refresh().await?;
        if let Some(id) = self.state.selected_id() {
            self.select(&id);
        }
        Ok(())
    }

    /// Number of news items and articles filed under the category.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub async fn references(&self, id: &DocumentId) -> Result<usize, ServiceError> {
        let (news, articles) = tokio::try_join!(
            self.news.count_in_category(id),
            self.articles.count_in_category(id)
        )?;
        Ok(news + articles)
    }

    /// Whether the category can be deleted: nothing refers to it.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub async fn can_delete(&self, id: &DocumentId) -> Result<bool, ServiceError> {
        Ok(self.references(id).await? == 0)
    }

    /// Deletes an unused category; the first remaining one becomes
    /// selected.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::CategoryInUse`] if news items or articles
    /// still refer to it, or the store error; the user is notified.
    #[instrument(skip(self), fields(%id))]
    pub async fn delete(&self, id: &DocumentId) -> Result<(), ServiceError> {
        let result = self.delete_unused(id).await;
        report(self.notifier.as_ref(), Operation::Deletion, SUBJECT, result)?;
        tracing::info!("Deleted category");

        self.refresh().await?;
        self.select_first();
        Ok(())
    }

    async fn delete_unused(&self, id: &DocumentId) -> Result<(), ServiceError> {
        let references = self.references(id).await?;
        if references > 0 {
            return Err(ServiceError::CategoryInUse {
                id: id.clone(),
                references,
            });
        }
        Ok(self.gateway.delete(id).await?)
    }
}

use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use super::{ListState, ServiceError, StateCell, report};
use crate::{
    domain::{DocumentId, News, NewsItem},
    notify::{Notifier, Operation},
    storage::NewsGateway,
};

const SUBJECT: &str = "the news item";

/// Owns the news list, the selected news item and its detail.
pub struct NewsService {
    gateway: NewsGateway,
    notifier: Arc<dyn Notifier>,
    state: StateCell<NewsItem, News>,
}

impl NewsService {
    /// A service with an empty state; call [`NewsService::load`] to fill it.
    #[must_use]
    pub fn new(gateway: NewsGateway, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            state: StateCell::new(),
        }
    }

    /// Follows every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListState<NewsItem, News>> {
        self.state.subscribe()
    }

    /// A copy of the current state.
    #[must_use]
    pub fn state(&self) -> ListState<NewsItem, News> {
        self.state.snapshot()
    }

    /// Reads the list; selects the first item if nothing is selected.
    ///
    /// # Errors
    ///
    /// Returns the store error; the user is notified.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), ServiceError> {
        let result = self.refresh_list().await;
        report(self.notifier.as_ref(), Operation::Load, SUBJECT, result)?;

        let first = self
            .state
            .with(|s| s.selected_id.is_none().then(|| s.items.first().map(|i| i.id.clone())))
            .flatten();
        if let Some(id) = first {
            self.select(&id).await?;
        }
        Ok(())
    }

    async fn refresh_list(&self) -> Result<(), ServiceError> {
        let items = self.gateway.read_all().await?;
        tracing::debug!(count = items.len(), "Loaded news items");
        self.state.set_items(items);
        Ok(())
    }

    /// Selects a news item and loads its detail.
    ///
    /// If another selection is made before the detail arrives, the result
    /// is discarded.
    ///
    /// # Errors
    ///
    /// Returns the store error; the user is notified unless the selection
    /// was superseded.
    #[instrument(skip(self), fields(%id))]
    pub async fn select(&self, id: &DocumentId) -> Result<(), ServiceError> {
        let ticket = self.state.begin_select(id);
        match self.gateway.read_by_id(id).await {
            Ok(detail) => {
                if !self.state.finish_select(ticket, detail) {
                    tracing::debug!("Discarded superseded selection");
                }
                Ok(())
            }
            Err(e) if self.state.is_latest(ticket) => {
                report(self.notifier.as_ref(), Operation::Load, SUBJECT, Err(e.into()))
            }
            Err(_) => Ok(()),
        }
    }

    /// Drops the selection.
    pub fn clear_selection(&self) {
        self.state.clear_selection();
    }

    /// Persists a new news item and selects it.
    ///
    /// # Errors
    ///
    /// Returns the store error; the user is notified and the state is left
    /// as it was.
    #[instrument(skip_all, fields(title = %news.title))]
    pub async fn create(&self, news: &News) -> Result<News, ServiceError> {
        let result = self.gateway.create(news).await.map_err(ServiceError::from);
        let created = report(self.notifier.as_ref(), Operation::Creation, SUBJECT, result)?;
        tracing::info!(id = ?created.id, "Created news item");

        self.after_write().await?;
        if let Some(id) = &created.id {
            self.select(id).await?;
        }
        Ok(created)
    }

    /// Persists an edited news item and reloads list and detail.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingId`] for a draft that was never
    /// created, or the store error; the user is notified.
    #[instrument(skip_all, fields(id = ?news.id))]
    pub async fn update(&self, news: &News) -> Result<(), ServiceError> {
        let result = match &news.id {
            Some(_) => self.gateway.update(news).await.map_err(ServiceError::from),
            None => Err(ServiceError::MissingId("news item")),
        };
        report(self.notifier.as_ref(), Operation::Update, SUBJECT, result)?;
        tracing::info!("Updated news item");

        self.after_write().await?;
        if let Some(id) = self.state.selected_id() {
            self.select(&id).await?;
        }
        Ok(())
    }

    /// Deletes a news item; the first remaining item becomes selected.
    ///
    /// # Errors
    ///
    /// Returns the store error; the user is notified.
    #[instrument(skip(self), fields(%id))]
    pub async fn delete(&self, id: &DocumentId) -> Result<(), ServiceError> {
        let result = self.gateway.delete(id).await.map_err(ServiceError::from);
        report(self.notifier.as_ref(), Operation::Deletion, SUBJECT, result)?;
        tracing::info!("Deleted news item");

        self.after_write().await?;
        match self.state.with(|s| s.items.first().map(|i| i.id.clone())) {
            Some(first) => self.select(&first).await,
            None => {
                self.state.clear_selection();
                Ok(())
            }
        }
    }

    async fn after_write(&self) -> Result<(), ServiceError> {
        let result = self.refresh_list().await;
        report(self.notifier.as_ref(), Operation::Load, SUBJECT, result)
    }
}

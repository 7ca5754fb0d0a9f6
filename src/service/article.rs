use std::sync::Arc;

use futures::future::{join_all, join3};
use tokio::sync::watch;
use tracing::instrument;

use super::{
    ChapterFailures, ChapterService, ListState, ServiceError, StateCell,
    chapter::{discard_image, upload_pending},
    report,
};
use crate::{
    domain::{Article, ArticleItem, Chapter, DocumentId},
    editor::ChapterList,
    notify::{Notifier, Operation},
    storage::{ArticleGateway, BlobPath, BlobStore},
};

const SUBJECT: &str = "the article";

/// Owns the article list, the selected article and its detail with
/// chapters.
///
/// An article is an aggregate: saving it also uploads its cover and writes
/// the chapters that changed in the draft.
pub struct ArticleService {
    gateway: ArticleGateway,
    chapters: ChapterService,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<dyn Notifier>,
    state: StateCell<ArticleItem, Article>,
}

impl ArticleService {
    /// A service with an empty state; call [`ArticleService::load`] to fill
    /// it.
    #[must_use]
    pub fn new(
        gateway: ArticleGateway,
        chapters: ChapterService,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            gateway,
            chapters,
            blobs,
            notifier,
            state: StateCell::new(),
        }
    }

    /// Follows every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListState<ArticleItem, Article>> {
        self.state.subscribe()
    }

    /// A copy of the current state.
    #[must_use]
    pub fn state(&self) -> ListState<ArticleItem, Article> {
        self.state.snapshot()
    }

    /// Reads the list; selects the first article if nothing is selected.
    ///
    /// # Errors
    ///
    /// Returns the store error; the user is notified.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), ServiceError> {
        self.refresh_list().await?;
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
        let result = self.gateway.read_all().await.map_err(ServiceError::from);
        let items = report(self.notifier.as_ref(), Operation::Load, SUBJECT, result)?;
        tracing::debug!(count = items.len(), "Loaded articles");
        self.state.set_items(items);
        Ok(())
    }

    /// Selects an article and loads it with its chapters, all tagged
    /// unchanged.
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
        match self.read_detail(id, ticket).await {
            Ok(detail) => {
                if !self.state.finish_select(ticket, detail) {
                    tracing::debug!("Discarded superseded selection");
                }
                Ok(())
            }
            Err(e) if self.state.is_latest(ticket) => {
                report(self.notifier.as_ref(), Operation::Load, SUBJECT, Err(e))
            }
            Err(_) => Ok(()),
        }
    }

    async fn read_detail(
        &self,
        id: &DocumentId,
        ticket: u64,
    ) -> Result<Option<Article>, ServiceError> {
        let Some(mut article) = self.gateway.read_by_id(id).await? else {
            return Ok(None);
        };
        // No point in reading chapters for a superseded selection.
        if self.state.is_latest(ticket) {
            let chapters = self.chapters.read_by_article(id).await?;
            article.chapters = ChapterList::from_persisted(chapters);
        }
        Ok(Some(article))
    }

    /// Drops the selection.
    pub fn clear_selection(&self) {
        self.state.clear_selection();
    }

    /// Creates an article: uploads the cover, persists the record, then
    /// creates the new chapters under the new id. The new article becomes
    /// selected.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingImageFile`] for a cover preview
    /// without a file, [`ServiceError::Chapters`] if some chapters could not
    /// be created (the article itself exists), or the store error. The user
    /// is notified.
    #[instrument(skip_all, fields(title = %article.title))]
    pub async fn create(&self, article: &Article) -> Result<Article, ServiceError> {
        let result = self.create_aggregate(article).await;
        let (created, failures) =
            report(self.notifier.as_ref(), Operation::Creation, SUBJECT, result)?;
        tracing::info!(%created, "Created article");

        self.refresh_list().await?;
        self.select(&created).await?;
        if let Some(failures) = failures {
            return report(
                self.notifier.as_ref(),
                Operation::Creation,
                SUBJECT,
                Err(failures.into()),
            );
        }
        self.state
            .with(|s| s.current.clone())
            .ok_or(ServiceError::NotFound {
                kind: "article",
                id: created,
            })
    }

    async fn create_aggregate(
        &self,
        article: &Article,
    ) -> Result<(DocumentId, Option<ChapterFailures>), ServiceError> {
        let image = upload_pending(
            self.blobs.as_ref(),
            &article.image,
            BlobPath::article_cover,
            "cover",
        )
        .await?;
        let created = self
            .gateway
            .create(&Article {
                image,
                ..article.clone()
            })
            .await?;
        let id = created.id.ok_or(ServiceError::MissingId("article"))?;

        let partition = article.chapters.partition();
        let results = join_all(
            partition
                .new
                .iter()
                .map(|&chapter| self.create_chapter(&id, chapter)),
        )
        .await;
        Ok((id, ChapterFailures::from_results(results)))
    }

    async fn create_chapter(
        &self,
        article: &DocumentId,
        chapter: &Chapter,
    ) -> (u32, Result<(), ServiceError>) {
        let chapter = Chapter {
            article: Some(article.clone()),
            ..chapter.clone()
        };
        let result = self.chapters.create(&chapter).await.map(drop);
        (chapter.order, result)
    }

    /// Saves an edited article: replaces a newly picked cover, writes the
    /// chapter changes of the draft, then persists the record. List and
    /// detail are reloaded afterwards.
    ///
    /// Chapters tagged `New` are created, `Updated` ones updated, and
    /// `ToBeDeleted` ones that were persisted are deleted. `Unchanged`
    /// chapters cause no writes.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingId`] for an article that was never
    /// created, [`ServiceError::MissingImageFile`] for a cover preview
    /// without a file, [`ServiceError::Chapters`] if some chapter writes
    /// failed (the record is saved regardless), or the store error. The
    /// user is notified.
    #[instrument(skip_all, fields(id = ?article.id))]
    pub async fn update(&self, article: &Article) -> Result<(), ServiceError> {
        let result = self.update_aggregate(article).await;
        let failures = report(self.notifier.as_ref(), Operation::Update, SUBJECT, result)?;
        tracing::info!("Updated article");

        self.refresh_list().await?;
        if let Some(id) = self.state.selected_id() {
            self.select(&id).await?;
        }
        match failures {
            Some(failures) => report(
                self.notifier.as_ref(),
                Operation::Update,
                SUBJECT,
                Err(failures.into()),
            ),
            None => Ok(()),
        }
    }

    async fn update_aggregate(
        &self,
        article: &Article,
    ) -> Result<Option<ChapterFailures>, ServiceError> {
        let id = article
            .id
            .as_ref()
            .ok_or(ServiceError::MissingId("article"))?;

        let mut record = article.clone();
        if article.image.is_local_preview() {
            if article.image.file.is_none() {
                return Err(ServiceError::MissingImageFile("cover"));
            }
            if let Some(previous) = self.previous_cover(id).await? {
                discard_image(self.blobs.as_ref(), &previous).await;
            }
            record.image = upload_pending(
                self.blobs.as_ref(),
                &article.image,
                BlobPath::article_cover,
                "cover",
            )
            .await?;
        }

        let partition = article.chapters.partition();
        let creates = partition
            .new
            .iter()
            .map(|&chapter| self.create_chapter(id, chapter));
        let updates = partition.updated.iter().map(|&chapter| async move {
            let chapter = Chapter {
                article: Some(id.clone()),
                ..chapter.clone()
            };
            (chapter.order, self.chapters.update(&chapter).await)
        });
        let deletes = partition
            .deletions()
            .map(|(_, chapter)| async move { (chapter.order, self.chapters.delete(chapter).await) });
        let (created, updated, deleted) =
            join3(join_all(creates), join_all(updates), join_all(deletes)).await;
        tracing::debug!(
            created = created.len(),
            updated = updated.len(),
            deleted = deleted.len(),
            unchanged = partition.unchanged.len(),
            "Wrote chapter changes"
        );
        let failures =
            ChapterFailures::from_results(created.into_iter().chain(updated).chain(deleted));

        self.gateway.update(&record).await?;
        Ok(failures)
    }

    /// The stored cover URL, from the list if loaded, else from the store.
    async fn previous_cover(&self, id: &DocumentId) -> Result<Option<String>, ServiceError> {
        let listed = self.state.with(|s| {
            s.items
                .iter()
                .find(|item| &item.id == id)
                .map(|item| item.image.url.clone())
        });
        match listed {
            Some(url) => Ok(Some(url)),
            None => Ok(self.gateway.read_by_id(id).await?.map(|a| a.image.url)),
        }
    }

    /// Deletes an article: every persisted chapter, then its cover and the
    /// record. The first remaining article becomes selected.
    ///
    /// The record and its cover are kept if any chapter could not be
    /// deleted, so the delete can be retried.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an unknown article,
    /// [`ServiceError::Chapters`] if chapters could not be deleted, or the
    /// store error. The user is notified.
    #[instrument(skip(self), fields(%id))]
    pub async fn delete(&self, id: &DocumentId) -> Result<(), ServiceError> {
        let result = self.delete_aggregate(id).await;
        report(self.notifier.as_ref(), Operation::Deletion, SUBJECT, result)?;
        tracing::info!("Deleted article");

        self.refresh_list().await?;
        match self.state.with(|s| s.items.first().map(|i| i.id.clone())) {
            Some(first) => self.select(&first).await,
            None => {
                self.state.clear_selection();
                Ok(())
            }
        }
    }

    async fn delete_aggregate(&self, id: &DocumentId) -> Result<(), ServiceError> {
        let article = self
            .gateway
            .read_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound {
                kind: "article",
                id: id.clone(),
            })?;
        let chapters = self.chapters.read_by_article(id).await?;
        let results = join_all(
            chapters
                .iter()
                .map(|chapter| async move { (chapter.order, self.chapters.delete(chapter).await) }),
        )
        .await;
        if let Some(failures) = ChapterFailures::from_results(results) {
            return Err(failures.into());
        }

        // Only now, so a kept record still shows its cover.
        discard_image(self.blobs.as_ref(), &article.image.url).await;
        Ok(self.gateway.delete(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{EntryStatus, Image, ImageFile},
        notify::NotificationLog,
        storage::{ChapterGateway, MemoryBlobStore, MemoryStore},
    };

    struct Fixture {
        store: Arc<MemoryStore>,
        blobs: Arc<MemoryBlobStore>,
        log: Arc<NotificationLog>,
        service: ArticleService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new("https://cdn.example"));
        let log = Arc::new(NotificationLog::default());
        let chapters = ChapterService::new(ChapterGateway::new(store.clone()), blobs.clone());
        let service = ArticleService::new(
            ArticleGateway::new(store.clone()),
            chapters,
            blobs.clone(),
            log.clone(),
        );
        Fixture {
            store,
            blobs,
            log,
            service,
        }
    }

    fn picked() -> Image {
        Image::picked(
            "data:image/jpeg;base64,/9j/",
            ImageFile {
                content_type: "image/jpeg".to_string(),
                bytes: vec![0xff, 0xd8],
            },
        )
    }

    fn draft(chapters: usize) -> Article {
        let mut article = Article {
            title: "The history of the harbour".to_string(),
            excerpt: "Four centuries of ships, storms and trade".to_string(),
            category: Some(DocumentId::new("history").unwrap()),
            text: "<p>Introduction</p>".to_string(),
            image: picked(),
            ..Article::default()
        };
        for n in 1..=chapters {
            article
                .chapters
                .insert(Chapter::new(format!("Chapter {n}"), "<p>text</p>"));
        }
        article
    }

    #[tokio::test]
    async fn create_uploads_cover_and_chapters() {
        let f = fixture();
        let created = f.service.create(&draft(2)).await.unwrap();

        let id = created.id.clone().unwrap();
        assert!(created.image.url.starts_with("https://cdn.example/images/articles/"));
        assert!(f.blobs.contains(&created.image.url).await);

        let entries = created.chapters.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.status == EntryStatus::Unchanged));
        assert!(entries.iter().all(|e| e.chapter.article.as_ref() == Some(&id)));

        let state = f.service.state();
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.selected_id, Some(id));
    }

    #[tokio::test]
    async fn update_writes_only_changed_chapters() {
        let f = fixture();
        let mut article = f.service.create(&draft(3)).await.unwrap();

        let mut edited = article.chapters.get(2).unwrap().clone();
        edited.title = "Edited".to_string();
        article.chapters.update(edited).unwrap();
        article.chapters.remove(3).unwrap();
        article
            .chapters
            .insert(Chapter::new("Fresh", "<p>new</p>"));

        let writes_before = f.store.write_count();
        f.service.update(&article).await.unwrap();
        // one create, one update, one delete, then the record
        assert_eq!(f.store.write_count() - writes_before, 4);

        let current = f.service.state().current.unwrap();
        let titles: Vec<_> = current
            .chapters
            .entries()
            .iter()
            .map(|e| (e.chapter.order, e.chapter.title.as_str()))
            .collect();
        // The fresh chapter takes the order freed by the deletion.
        assert_eq!(titles, vec![(1, "Chapter 1"), (2, "Edited"), (3, "Fresh")]);
    }

    #[tokio::test]
    async fn unchanged_chapters_cause_no_writes() {
        let f = fixture();
        let article = f.service.create(&draft(2)).await.unwrap();

        let writes_before = f.store.write_count();
        f.service.update(&article).await.unwrap();
        assert_eq!(f.store.write_count() - writes_before, 1);
    }

    #[tokio::test]
    async fn new_cover_replaces_the_old_one() {
        let f = fixture();
        let mut article = f.service.create(&draft(0)).await.unwrap();
        let old_cover = article.image.url.clone();

        article.image = picked();
        f.service.update(&article).await.unwrap();

        let new_cover = f.service.state().current.unwrap().image.url;
        assert_ne!(new_cover, old_cover);
        assert!(!f.blobs.contains(&old_cover).await);
        assert!(f.blobs.contains(&new_cover).await);
        assert_eq!(f.blobs.paths().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_chapter_creates_are_reported() {
        let f = fixture();
        let mut article = draft(1);
        article.chapters.insert(Chapter {
            image: Image::stored("data:image/png;base64,AAAA"),
            ..Chapter::new("Broken", "")
        });

        let error = f.service.create(&article).await.unwrap_err();
        let ServiceError::Chapters(failures) = error else {
            panic!("expected chapter failures, got {error:?}");
        };
        assert_eq!(failures.failures().len(), 1);
        assert_eq!(failures.failures().first().order, 2);

        // The article and its valid chapter exist.
        let current = f.service.state().current.unwrap();
        assert_eq!(current.chapters.entries().len(), 1);
        assert_eq!(f.log.drain()[0].title, "Creation error");
    }

    #[tokio::test]
    async fn delete_removes_the_whole_aggregate() {
        let f = fixture();
        let mut article = draft(1);
        article.chapters.insert(Chapter {
            image: picked(),
            ..Chapter::new("Pictured", "")
        });
        let created = f.service.create(&article).await.unwrap();

        f.service.delete(created.id.as_ref().unwrap()).await.unwrap();

        assert_eq!(f.store.count(ArticleGateway::COLLECTION).await, 0);
        assert_eq!(f.store.count(ChapterGateway::COLLECTION).await, 0);
        assert!(f.blobs.paths().await.is_empty());
        assert_eq!(f.service.state(), ListState::default());
    }

    #[tokio::test]
    async fn record_survives_when_chapters_cannot_be_deleted() {
        let f = fixture();
        let created = f.service.create(&draft(2)).await.unwrap();
        f.store
            .set_unavailable(ChapterGateway::COLLECTION, true)
            .await;

        let id = created.id.unwrap();
        assert!(f.service.delete(&id).await.is_err());
        assert_eq!(f.store.count(ArticleGateway::COLLECTION).await, 1);
        assert!(f.blobs.contains(&created.image.url).await);
        assert_eq!(f.log.drain()[0].title, "Deletion error");
    }

    #[tokio::test]
    async fn removing_a_chapter_with_a_repicked_image_deletes_the_stored_one() {
        let f = fixture();
        let mut article = draft(0);
        article.chapters.insert(Chapter {
            image: picked(),
            ..Chapter::new("Pictured", "")
        });
        let created = f.service.create(&article).await.unwrap();
        let chapter_url = created.chapters.get(1).unwrap().image.url.clone();

        let mut edited = created.clone();
        let chapter = edited.chapters.get(1).cloned().unwrap();
        edited
            .chapters
            .update(Chapter {
                image: picked(),
                ..chapter
            })
            .unwrap();
        edited.chapters.remove(1).unwrap();
        f.service.update(&edited).await.unwrap();

        assert_eq!(f.store.count(ChapterGateway::COLLECTION).await, 0);
        assert!(!f.blobs.contains(&chapter_url).await);
        assert_eq!(f.blobs.paths().await.len(), 1);
        assert!(f.blobs.contains(&created.image.url).await);
    }

    #[tokio::test]
    async fn deleting_an_unknown_article_is_not_found() {
        let f = fixture();
        let error = f
            .service
            .delete(&DocumentId::new("ghost").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(error, ServiceError::NotFound { kind: "article", .. }));
    }
}

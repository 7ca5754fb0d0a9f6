use std::sync::Arc;

use tracing::instrument;

use super::ServiceError;
use crate::{
    domain::{Chapter, DocumentId, Image},
    storage::{BlobPath, BlobStore, ChapterGateway},
};

/// Chapter writes together with their image lifecycle.
///
/// Used by the article service for the chapter batches of an article save;
/// it keeps no state and does not notify.
#[derive(Clone)]
pub struct ChapterService {
    gateway: ChapterGateway,
    blobs: Arc<dyn BlobStore>,
}

/// Removes an image that is no longer referenced. Failures only leave an
/// orphaned blob behind, so they are logged and ignored.
pub(crate) async fn discard_image(blobs: &dyn BlobStore, url: &str) {
    if url.is_empty() {
        return;
    }
    match blobs.delete(url).await {
        Ok(()) => tracing::debug!(url, "Deleted image"),
        Err(error) => tracing::warn!(url, %error, "Failed to delete image"),
    }
}

/// Uploads the file of a freshly picked image to `path` and returns the
/// stored image. Stored images are returned unchanged.
pub(crate) async fn upload_pending(
    blobs: &dyn BlobStore,
    image: &Image,
    path: impl FnOnce() -> BlobPath,
    owner: &'static str,
) -> Result<Image, ServiceError> {
    if !image.is_local_preview() {
        return Ok(image.clone());
    }
    let file = image
        .file
        .as_ref()
        .ok_or(ServiceError::MissingImageFile(owner))?;
    let url = blobs.upload(&path(), &file.content_type, &file.bytes).await?;
    tracing::debug!(%url, "Uploaded image");
    Ok(Image::stored(url))
}

impl ChapterService {
    /// A service writing through `gateway` and storing images in `blobs`.
    #[must_use]
    pub fn new(gateway: ChapterGateway, blobs: Arc<dyn BlobStore>) -> Self {
        Self { gateway, blobs }
    }

    fn article_of(chapter: &Chapter) -> Result<&DocumentId, ServiceError> {
        chapter
            .article
            .as_ref()
            .ok_or(ServiceError::MissingId("article of the chapter"))
    }

    /// The chapters of an article, by order.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub async fn read_by_article(&self, article: &DocumentId) -> Result<Vec<Chapter>, ServiceError> {
        Ok(self.gateway.read_by_article(article).await?)
    }

    /// Uploads a newly picked image, then persists the chapter.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingId`] for a chapter not attached to an
    /// article, [`ServiceError::MissingImageFile`] for a preview without a
    /// file, or the store error.
    #[instrument(skip_all, fields(order = chapter.order))]
    pub async fn create(&self, chapter: &Chapter) -> Result<Chapter, ServiceError> {
        let article = Self::article_of(chapter)?;
        let image = upload_pending(
            self.blobs.as_ref(),
            &chapter.image,
            || BlobPath::chapter_image(article),
            "chapter",
        )
        .await?;

        let created = self
            .gateway
            .create(&Chapter {
                image,
                ..chapter.clone()
            })
            .await?;
        tracing::info!(id = ?created.id, "Created chapter");
        Ok(created)
    }

    /// Replaces a newly picked image, then persists the chapter.
    ///
    /// The previous image is read from the store and deleted; failing to
    /// delete it is tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingId`] for a chapter that was never
    /// created, [`ServiceError::MissingImageFile`] for a preview without a
    /// file, or the store error.
    #[instrument(skip_all, fields(id = ?chapter.id, order = chapter.order))]
    pub async fn update(&self, chapter: &Chapter) -> Result<(), ServiceError> {
        let id = chapter.id.as_ref().ok_or(ServiceError::MissingId("chapter"))?;

        let mut chapter = chapter.clone();
        if chapter.image.is_local_preview() {
            let article = Self::article_of(&chapter)?.clone();
            if chapter.image.file.is_none() {
                return Err(ServiceError::MissingImageFile("chapter"));
            }
            if let Some(previous) = self.gateway.read_by_id(id).await? {
                discard_image(self.blobs.as_ref(), &previous.image.url).await;
            }
            chapter.image = upload_pending(
                self.blobs.as_ref(),
                &chapter.image,
                || BlobPath::chapter_image(&article),
                "chapter",
            )
            .await?;
        }

        self.gateway.update(&chapter).await?;
        tracing::info!("Updated chapter");
        Ok(())
    }

    /// Deletes a chapter and its image. Failing to delete the image is
    /// tolerated.
    ///
    /// The image is taken from the stored chapter, since the draft may hold
    /// a newly picked preview instead.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingId`] for a chapter that was never
    /// created, or the store error.
    #[instrument(skip_all, fields(id = ?chapter.id))]
    pub async fn delete(&self, chapter: &Chapter) -> Result<(), ServiceError> {
        let id = chapter.id.as_ref().ok_or(ServiceError::MissingId("chapter"))?;
        let stored = self.gateway.read_by_id(id).await?.map(|c| c.image.url);
        if let Some(url) = &stored {
            discard_image(self.blobs.as_ref(), url).await;
        }
        let draft = &chapter.image.url;
        if !chapter.image.is_local_preview() && stored.as_ref() != Some(draft) {
            discard_image(self.blobs.as_ref(), draft).await;
        }
        self.gateway.delete(id).await?;
        tracing::info!("Deleted chapter");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::ImageFile,
        storage::{MemoryBlobStore, MemoryStore},
    };

    fn service() -> (Arc<MemoryBlobStore>, ChapterService) {
        let blobs = Arc::new(MemoryBlobStore::new("https://cdn.example"));
        let gateway = ChapterGateway::new(Arc::new(MemoryStore::new()));
        (blobs.clone(), ChapterService::new(gateway, blobs))
    }

    fn picked() -> Image {
        Image::picked(
            "data:image/png;base64,AAAA",
            ImageFile {
                content_type: "image/png".to_string(),
                bytes: vec![1, 2, 3],
            },
        )
    }

    fn chapter(image: Image) -> Chapter {
        Chapter {
            article: Some(DocumentId::new("a1").unwrap()),
            order: 1,
            image,
            ..Chapter::new("Harbour", "")
        }
    }

    #[tokio::test]
    async fn create_uploads_under_the_article() {
        let (blobs, service) = service();
        let created = service.create(&chapter(picked())).await.unwrap();

        assert!(
            created
                .image
                .url
                .starts_with("https://cdn.example/images/articles/a1/")
        );
        assert!(created.image.file.is_none());
        assert!(blobs.contains(&created.image.url).await);
    }

    #[tokio::test]
    async fn preview_without_file_is_refused() {
        let (_blobs, service) = service();
        let error = service
            .create(&chapter(Image::stored("data:image/png;base64,AAAA")))
            .await
            .unwrap_err();
        assert!(matches!(error, ServiceError::MissingImageFile("chapter")));
    }

    #[tokio::test]
    async fn update_replaces_the_stored_image() {
        let (blobs, service) = service();
        let created = service.create(&chapter(picked())).await.unwrap();
        let old_url = created.image.url.clone();

        service
            .update(&Chapter {
                image: picked(),
                ..created.clone()
            })
            .await
            .unwrap();

        let paths = blobs.paths().await;
        assert_eq!(paths.len(), 1);
        assert!(!blobs.contains(&old_url).await);

        let stored = service
            .read_by_article(&DocumentId::new("a1").unwrap())
            .await
            .unwrap();
        assert!(blobs.contains(&stored[0].image.url).await);
    }

    #[tokio::test]
    async fn delete_removes_the_stored_image_of_a_repicked_chapter() {
        let (blobs, service) = service();
        let created = service.create(&chapter(picked())).await.unwrap();
        let stored_url = created.image.url.clone();

        service
            .delete(&Chapter {
                image: picked(),
                ..created
            })
            .await
            .unwrap();

        assert!(!blobs.contains(&stored_url).await);
        assert!(blobs.paths().await.is_empty());
    }

    #[tokio::test]
    async fn delete_tolerates_a_missing_image() {
        let (blobs, service) = service();
        let created = service.create(&chapter(picked())).await.unwrap();
        blobs.delete(&created.image.url).await.unwrap();

        service.delete(&created).await.unwrap();
        assert!(
            service
                .read_by_article(&DocumentId::new("a1").unwrap())
                .await
                .unwrap()
                .is_empty()
        );
    }
}

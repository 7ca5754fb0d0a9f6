//! Entity services: the owners of list, selection and detail state.
//!
//! A service sequences the store round trips of a write, then refreshes its
//! state from the store. Failures are reported to the user through the
//! [`Notifier`] and returned to the caller; the state keeps its last known
//! good value.

use std::fmt;

use nonempty::NonEmpty;

use crate::{
    domain::DocumentId,
    notify::{Level, Notification, Notifier, Operation},
    storage::{BlobError, StoreError},
};

mod article;
pub use article::ArticleService;

mod category;
pub use category::CategoryService;

mod chapter;
pub use chapter::ChapterService;

mod news;
pub use news::NewsService;

mod state;
pub use state::ListState;
pub(crate) use state::StateCell;

/// Error returned by service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A document store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A blob store call failed.
    #[error(transparent)]
    Blob(#[from] BlobError),
    /// The category is still referenced and cannot be deleted.
    #[error("category {id} is used by {references} news items and articles")]
    CategoryInUse {
        /// The category.
        id: DocumentId,
        /// How many news items and articles refer to it.
        references: usize,
    },
    /// An image shows a local preview but has no file to upload.
    #[error("the {0} image has a preview but no file to upload")]
    MissingImageFile(&'static str),
    /// An entity that must be persisted has no id.
    #[error("the {0} has not been saved yet")]
    MissingId(&'static str),
    /// The entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind of entity.
        kind: &'static str,
        /// The id that was looked up.
        id: DocumentId,
    },
    /// Some chapter writes of an article save failed.
    #[error(transparent)]
    Chapters(#[from] ChapterFailures),
}

/// A chapter write that failed.
#[derive(Debug)]
pub struct ChapterFailure {
    /// Order of the chapter within its article.
    pub order: u32,
    /// What went wrong.
    pub error: Box<ServiceError>,
}

/// The chapter writes of one batch that failed.
#[derive(Debug, thiserror::Error)]
pub struct ChapterFailures {
    failures: NonEmpty<ChapterFailure>,
}

impl ChapterFailures {
    /// Collects the failures of a batch, `None` if everything succeeded.
    pub(crate) fn from_results(
        results: impl IntoIterator<Item = (u32, Result<(), ServiceError>)>,
    ) -> Option<Self> {
        let failures = results
            .into_iter()
            .filter_map(|(order, result)| {
                result.err().map(|error| ChapterFailure {
                    order,
                    error: Box::new(error),
                })
            })
            .collect();
        NonEmpty::from_vec(failures).map(|failures| Self { failures })
    }

    /// The failed writes.
    #[must_use]
    pub const fn failures(&self) -> &NonEmpty<ChapterFailure> {
        &self.failures
    }
}

impl fmt::Display for ChapterFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_DISPLAY: usize = 5;

        write!(f, "failed to save chapters: ")?;

        let total = self.failures.len();
        let displayed: Vec<String> = self
            .failures
            .iter()
            .take(MAX_DISPLAY)
            .map(|failure| format!("{} ({})", failure.order, failure.error))
            .collect();
        let msg = displayed.join(", ");

        if total <= MAX_DISPLAY {
            write!(f, "{msg}")
        } else {
            write!(f, "{msg}... (and {} more)", total - MAX_DISPLAY)
        }
    }
}

/// Logs a failed operation and tells the user about it.
fn report<T>(
    notifier: &dyn Notifier,
    operation: Operation,
    subject: &str,
    result: Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    if let Err(error) = &result {
        tracing::error!(?operation, subject, %error, "Operation failed");
        let notification = match error {
            ServiceError::CategoryInUse { references, .. } => Notification::new(
                Level::Warning,
                "Deletion error",
                format!(
                    "This category is still used by {references} news items and articles and cannot be deleted."
                ),
            ),
            _ => Notification::failed(operation, subject),
        };
        notifier.notify(notification);
    }
    result
}

//! The ordered, status-tagged chapter collection of an article draft.
//!
//! Entries are located by their `order`, never by position: the list keeps
//! unsaved and marked-for-deletion entries whose positions mean nothing to
//! the store. Deleting only flips the tag, so the service can tell a real
//! delete from an entry that was never persisted.

use tracing::instrument;

use crate::domain::{Chapter, DocumentId, EntryStatus};

/// A chapter together with its change tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    /// What happened to the chapter in this draft.
    pub status: EntryStatus,
    /// The chapter itself.
    pub chapter: Chapter,
}

impl ChapterEntry {
    fn is_live(&self) -> bool {
        self.status != EntryStatus::ToBeDeleted
    }
}

/// Error returned when editing a chapter that is not in the list.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EditorError {
    /// No live chapter has this order.
    #[error("no chapter with order {0}")]
    UnknownOrder(u32),
}

/// The chapters of an article draft, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterList {
    entries: Vec<ChapterEntry>,
}

/// The chapters of a draft split by change tag.
///
/// Every entry lands in exactly one bucket.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    /// Chapters to create.
    pub new: Vec<&'a Chapter>,
    /// Chapters to update.
    pub updated: Vec<&'a Chapter>,
    /// Chapters marked for deletion, persisted or not.
    pub to_be_deleted: Vec<&'a Chapter>,
    /// Chapters left alone.
    pub unchanged: Vec<&'a Chapter>,
}

impl<'a> Partition<'a> {
    /// The marked chapters that exist in the store and must be deleted there.
    pub fn deletions(&self) -> impl Iterator<Item = (&'a DocumentId, &'a Chapter)> + '_ {
        self.to_be_deleted
            .iter()
            .filter_map(|&chapter| chapter.id.as_ref().map(|id| (id, chapter)))
    }

    /// Number of store calls a submit of this partition issues.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.new.len() + self.updated.len() + self.deletions().count()
    }
}

impl ChapterList {
    /// Wraps chapters freshly read from the store, all tagged `Unchanged`.
    #[must_use]
    pub fn from_persisted(chapters: impl IntoIterator<Item = Chapter>) -> Self {
        Self {
            entries: chapters
                .into_iter()
                .map(|chapter| ChapterEntry {
                    status: EntryStatus::Unchanged,
                    chapter,
                })
                .collect(),
        }
    }

    /// Every entry, including the ones marked for deletion.
    #[must_use]
    pub fn entries(&self) -> &[ChapterEntry] {
        &self.entries
    }

    /// The entries that are not marked for deletion, with their list index.
    pub fn live(&self) -> impl Iterator<Item = (usize, &ChapterEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_live())
    }

    /// Whether there is nothing left to show: no entries, or all of them
    /// marked for deletion.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live().next().is_none()
    }

    /// The live chapter with the given order.
    #[must_use]
    pub fn get(&self, order: u32) -> Option<&Chapter> {
        self.position(order).map(|i| &self.entries[i].chapter)
    }

    fn position(&self, order: u32) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.is_live() && entry.chapter.order == order)
    }

    /// The order the next inserted chapter receives.
    #[must_use]
    pub fn next_order(&self) -> u32 {
        self.live()
            .map(|(_, entry)| entry.chapter.order)
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Appends a new chapter and returns the order it was given.
    #[instrument(skip(self, chapter), fields(title = %chapter.title))]
    pub fn insert(&mut self, mut chapter: Chapter) -> u32 {
        let order = self.next_order();
        chapter.order = order;
        self.entries.push(ChapterEntry {
            status: EntryStatus::New,
            chapter,
        });
        tracing::debug!(order, "inserted chapter");
        order
    }

    /// Replaces the live chapter with the same order.
    ///
    /// A saved chapter becomes `Updated`; a `New` one stays `New`.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownOrder`] if no live chapter has that
    /// order.
    pub fn update(&mut self, mut chapter: Chapter) -> Result<(), EditorError> {
        let index = self
            .position(chapter.order)
            .ok_or(EditorError::UnknownOrder(chapter.order))?;
        let entry = &mut self.entries[index];

        // ids belong to the store, not to the form
        chapter.id = entry.chapter.id.take();
        entry.chapter = chapter;
        if entry.status == EntryStatus::Unchanged {
            entry.status = EntryStatus::Updated;
        }
        Ok(())
    }

    /// Saves the chapter coming out of the chapter form.
    ///
    /// A chapter that already has an order is updated, anything else is
    /// inserted. Returns the chapter's order.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownOrder`] if the chapter carries an order
    /// that is not in the list.
    pub fn save(&mut self, chapter: Chapter) -> Result<u32, EditorError> {
        if chapter.order == 0 {
            Ok(self.insert(chapter))
        } else {
            let order = chapter.order;
            self.update(chapter)?;
            Ok(order)
        }
    }

    /// Marks the live chapter with the given order for deletion.
    ///
    /// The entry stays in the list; survivors keep their order.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownOrder`] if no live chapter has that
    /// order.
    pub fn remove(&mut self, order: u32) -> Result<(), EditorError> {
        let index = self
            .position(order)
            .ok_or(EditorError::UnknownOrder(order))?;
        self.entries[index].status = EntryStatus::ToBeDeleted;
        Ok(())
    }

    /// Splits the entries by change tag.
    #[must_use]
    pub fn partition(&self) -> Partition<'_> {
        let mut partition = Partition::default();
        for entry in &self.entries {
            let bucket = match entry.status {
                EntryStatus::New => &mut partition.new,
                EntryStatus::Updated => &mut partition.updated,
                EntryStatus::ToBeDeleted => &mut partition.to_be_deleted,
                EntryStatus::Unchanged => &mut partition.unchanged,
            };
            bucket.push(&entry.chapter);
        }
        partition
    }
}

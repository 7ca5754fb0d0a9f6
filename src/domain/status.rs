use std::fmt;

use serde::{Deserialize, Serialize};

/// Publication status of a news item or article.
///
/// A `Concept` is only visible in the CMS; `Current` items are public.
/// Persisted as an integer (`0` / `1`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Status {
    /// Work in progress, not yet published.
    #[default]
    Concept,
    /// Published.
    Current,
}

impl Status {
    /// Whether items with this status are shown on the public pages.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Current)
    }
}

/// Error returned when decoding an unknown status value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown status value {0}")]
pub struct UnknownStatusError(u8);

impl TryFrom<u8> for Status {
    type Error = UnknownStatusError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Concept),
            1 => Ok(Self::Current),
            other => Err(UnknownStatusError(other)),
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        match status {
            Status::Concept => 0,
            Status::Current => 1,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Concept => write!(f, "concept"),
            Self::Current => write!(f, "current"),
        }
    }
}

/// Client-side change tag of a chapter inside an article draft.
///
/// Never persisted. Used on submit to reconcile the chapter list against the
/// store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    /// Loaded from the store and not edited since.
    #[default]
    Unchanged,
    /// Added in this draft, not persisted yet.
    New,
    /// Loaded from the store and edited since.
    Updated,
    /// Marked for removal.
    ToBeDeleted,
}

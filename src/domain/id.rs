use std::{fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A store-generated document identifier.
///
/// Identifiers are opaque, non-empty strings. An entity that has never been
/// persisted has no identifier at all (`Option<DocumentId>`), so an empty id
/// can never stand in for "not found".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(NonEmptyString);

impl DocumentId {
    /// Creates a new `DocumentId` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyIdError`] if the string is empty.
    pub fn new(s: impl Into<String>) -> Result<Self, EmptyIdError> {
        NonEmptyString::new(s.into())
            .map(Self)
            .map_err(|_| EmptyIdError)
    }

    /// Generates a fresh, globally unique identifier.
    #[must_use]
    pub fn generate() -> Self {
        let raw = Uuid::new_v4().simple().to_string();
        Self(NonEmptyString::new(raw).expect("a uuid is never empty"))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Error returned when constructing a [`DocumentId`] from an empty string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("document ids must not be empty")]
pub struct EmptyIdError;

impl TryFrom<String> for DocumentId {
    type Error = EmptyIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for DocumentId {
    type Error = EmptyIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0.as_str().to_string()
    }
}

impl FromStr for DocumentId {
    type Err = EmptyIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for DocumentId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_id_is_rejected() {
        assert_eq!(DocumentId::new(""), Err(EmptyIdError));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(DocumentId::generate(), DocumentId::generate());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = DocumentId::new("abc123").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");

        let parsed: DocumentId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(parsed, id);

        assert!(serde_json::from_str::<DocumentId>("\"\"").is_err());
    }
}

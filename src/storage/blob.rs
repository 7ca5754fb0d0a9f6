//! Binary storage for article and chapter images.
//!
//! Blobs live under namespaced paths and are addressed by public URLs of the
//! form `{base_url}/{path}`. A path is never derived from the original file
//! name: every upload gets a fresh random token.

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::DocumentId;

const ARTICLE_IMAGES: &str = "images/articles";

/// Error returned by blob operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The backing file could not be read or written.
    #[error("blob I/O error at {path}")]
    Io {
        /// The blob path involved.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// There is no blob at this path.
    #[error("no blob at {0}")]
    NotFound(String),
    /// The path or URL does not name a blob of this store.
    #[error("invalid blob path: {0}")]
    InvalidPath(String),
    /// The backend refused the request.
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

/// A relative, slash-separated location inside a blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobPath(String);

impl BlobPath {
    /// Validates a relative blob path.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::InvalidPath`] for empty or absolute paths and
    /// for paths with empty, `.` or `..` segments.
    pub fn new(path: impl Into<String>) -> Result<Self, BlobError> {
        let path = path.into();
        let well_formed = !path.is_empty()
            && path
                .split('/')
                .all(|segment| !matches!(segment, "" | "." | ".."));
        if well_formed {
            Ok(Self(path))
        } else {
            Err(BlobError::InvalidPath(path))
        }
    }

    /// A fresh path for an article cover: `images/articles/{token}`.
    #[must_use]
    pub fn article_cover() -> Self {
        Self(format!("{ARTICLE_IMAGES}/{}", token()))
    }

    /// A fresh path for a chapter image, scoped to its article:
    /// `images/articles/{article}/{token}`.
    #[must_use]
    pub fn chapter_image(article: &DocumentId) -> Self {
        Self(format!("{ARTICLE_IMAGES}/{article}/{}", token()))
    }

    /// The path as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolves a public URL handed out under `base_url`, or a bare path.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::InvalidPath`] if the result is not a valid path,
    /// which includes URLs of other hosts.
    pub fn from_url(base_url: &str, path_or_url: &str) -> Result<Self, BlobError> {
        let prefix = format!("{}/", base_url.trim_end_matches('/'));
        match path_or_url.strip_prefix(&prefix) {
            Some(path) => Self::new(path),
            None if path_or_url.contains("://") => {
                Err(BlobError::InvalidPath(path_or_url.to_string()))
            }
            None => Self::new(path_or_url),
        }
    }

    /// The public URL of this path under `base_url`.
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// The contract of the image storage backend.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` at `path` and returns the public URL.
    async fn upload(
        &self,
        path: &BlobPath,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, BlobError>;

    /// Removes the blob at a path or at a URL previously returned by
    /// [`BlobStore::upload`].
    ///
    /// Removing a missing blob is [`BlobError::NotFound`]; callers decide
    /// whether to tolerate it.
    async fn delete(&self, path_or_url: &str) -> Result<(), BlobError>;
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn cover_paths_are_unique_tokens() {
        let a = BlobPath::article_cover();
        let b = BlobPath::article_cover();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("images/articles/"));
        assert_eq!(a.as_str().split('/').count(), 3);
    }

    #[test]
    fn chapter_paths_are_scoped_to_the_article() {
        let article = DocumentId::new("a1").unwrap();
        let path = BlobPath::chapter_image(&article);
        assert!(path.as_str().starts_with("images/articles/a1/"));
        assert_eq!(path.as_str().split('/').count(), 4);
    }

    #[test_case(""; "empty")]
    #[test_case("/images/x"; "absolute")]
    #[test_case("images//x"; "empty segment")]
    #[test_case("images/../secrets"; "parent segment")]
    fn malformed_paths_are_rejected(path: &str) {
        assert!(matches!(BlobPath::new(path), Err(BlobError::InvalidPath(_))));
    }

    #[test_case("https://cdn.example/images/articles/abc", Some("images/articles/abc"); "own url")]
    #[test_case("https://cdn.example//images/articles/abc", None; "url with empty segment")]
    #[test_case("images/articles/abc", Some("images/articles/abc"); "bare path")]
    #[test_case("https://elsewhere.example/images/articles/abc", None; "foreign url")]
    fn resolves_urls(input: &str, expected: Option<&str>) {
        let resolved = BlobPath::from_url("https://cdn.example/", input).ok();
        assert_eq!(resolved.as_ref().map(BlobPath::as_str), expected);
    }

    #[test]
    fn url_joins_base_and_path() {
        let path = BlobPath::new("images/articles/abc").unwrap();
        assert_eq!(
            path.url("https://cdn.example/"),
            "https://cdn.example/images/articles/abc"
        );
    }
}

use crate::validation::{Validate, Validator};

/// The URL prefix of an image that was picked locally but not uploaded yet.
const PREVIEW_PREFIX: &str = "data:image";

/// An image embedded in an article or chapter.
///
/// `url` is either the public URL of a stored blob or, while a new image is
/// being picked, a `data:image/...` preview. Only the URL is ever persisted;
/// the file payload lives in the draft until it is uploaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    /// Persisted blob URL or local preview.
    pub url: String,
    /// The payload waiting to be uploaded.
    pub file: Option<ImageFile>,
}

/// The raw bytes of an image picked for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// MIME type of the payload, e.g. `image/png`.
    pub content_type: String,
    /// Image bytes.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Image {
    /// An image that is already stored at `url`.
    #[must_use]
    pub fn stored(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file: None,
        }
    }

    /// A freshly picked image, shown through `preview` until uploaded.
    #[must_use]
    pub fn picked(preview: impl Into<String>, file: ImageFile) -> Self {
        Self {
            url: preview.into(),
            file: Some(file),
        }
    }

    /// Whether there is no image at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }

    /// Whether the URL is a local preview rather than a stored blob.
    #[must_use]
    pub fn is_local_preview(&self) -> bool {
        self.url.starts_with(PREVIEW_PREFIX)
    }

    /// Whether this image replaces whatever was stored before.
    ///
    /// True when the URL is a local preview and a payload is attached.
    #[must_use]
    pub fn has_pending_upload(&self) -> bool {
        self.is_local_preview() && self.file.is_some()
    }
}

/// Schema of a mandatory image, such as an article cover.
///
/// A chapter image is optional and is not checked with this schema.
impl Validate for Image {
    fn validate_into(&self, v: &mut Validator<'_>) {
        v.field("imageUrl", &self.url)
            .required("Please upload an image. It is required.");
    }
}

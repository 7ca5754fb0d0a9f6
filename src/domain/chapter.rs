use crate::{
    domain::{DocumentId, Image, rich_text},
    validation::{Validate, Validator},
};

/// A chapter of an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Store id, `None` until created.
    pub id: Option<DocumentId>,
    /// The owning article, stamped when the article is saved.
    pub article: Option<DocumentId>,
    /// Mandatory title, even when it is not shown.
    pub title: String,
    /// 1-based position within the article; `0` until inserted.
    pub order: u32,
    /// Whether the title is rendered in the article.
    pub show_title: bool,
    /// Optional body as rich text.
    pub text: String,
    /// Optional image.
    pub image: Image,
    /// Caption below the image.
    pub image_caption: String,
}

impl Default for Chapter {
    fn default() -> Self {
        Self {
            id: None,
            article: None,
            title: String::new(),
            order: 0,
            show_title: true,
            text: String::new(),
            image: Image::default(),
            image_caption: String::new(),
        }
    }
}

impl Chapter {
    /// A new chapter with the given title and body.
    #[must_use]
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Whether the chapter has neither visible text nor an image.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        rich_text::is_blank(&self.text) && self.image.is_empty()
    }
}

const TEXT_OR_IMAGE: &str = "A chapter must have either text or an image.";

impl Validate for Chapter {
    fn validate_into(&self, v: &mut Validator<'_>) {
        v.field("title", &self.title)
            .required("A chapter must have a title.")
            .max_len(50, "The title can be no more than 50 characters.");

        // Both fields carry the error so either one can be fixed.
        let has_content = !self.is_blank();
        v.field("text", &self.text)
            .check(has_content, "at-least-one", TEXT_OR_IMAGE);
        v.field("image.imageUrl", &self.image.url)
            .check(has_content, "at-least-one", TEXT_OR_IMAGE);

        v.field("imageCaption", &self.image_caption).max_len(
            100,
            "The caption of an image can be no more than 100 characters.",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Rule;

    #[test]
    fn chapter_without_text_or_image_is_invalid_on_both_fields() {
        let report = Chapter::new("Intro", "").validate();

        for path in ["text", "image.imageUrl"] {
            let error = report.error(path).unwrap();
            assert_eq!(error.rule, Rule::Custom("at-least-one"));
            assert_eq!(error.message, TEXT_OR_IMAGE);
        }
    }

    #[test]
    fn text_alone_satisfies_both_fields() {
        let report = Chapter::new("Intro", "<p>Once upon a time</p>").validate();
        assert!(report.is_field_valid("text"));
        assert!(report.is_field_valid("image.imageUrl"));
    }

    #[test]
    fn image_alone_satisfies_both_fields() {
        let chapter = Chapter {
            image: Image::stored("https://cdn/images/articles/a/b"),
            ..Chapter::new("Intro", "")
        };
        let report = chapter.validate();
        assert!(report.is_valid());
    }

    #[test]
    fn markup_only_text_counts_as_empty() {
        let report = Chapter::new("Intro", "<p></p>").validate();
        assert!(report.error("text").is_some());
    }

    #[test]
    fn title_and_caption_limits() {
        let chapter = Chapter {
            image_caption: "c".repeat(101),
            ..Chapter::new("t".repeat(51), "body")
        };
        let report = chapter.validate();
        assert_eq!(report.error("title").unwrap().rule, Rule::MaxLength(50));
        assert_eq!(
            report.error("imageCaption").unwrap().rule,
            Rule::MaxLength(100)
        );
    }

    #[test]
    fn revalidating_an_unchanged_chapter_is_stable() {
        let chapter = Chapter::new("", "");
        assert_eq!(chapter.validate(), chapter.validate());
    }
}

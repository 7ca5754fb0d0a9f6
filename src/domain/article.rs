use chrono::{DateTime, Utc};

use crate::{
    domain::{DocumentId, Image, Status, news::Headline},
    editor::ChapterList,
    validation::{Validate, Validator},
};

/// The list projection of an article: a news item with a cover image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleItem {
    /// Store id.
    pub id: DocumentId,
    /// Headline.
    pub title: String,
    /// Teaser shown in lists.
    pub excerpt: String,
    /// When the article was last written.
    pub update_date: DateTime<Utc>,
    /// The category the article is filed under.
    pub category: Option<DocumentId>,
    /// Publication status.
    pub status: Status,
    /// Cover image.
    pub image: Image,
}

/// A full article with its chapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Store id, `None` until created.
    pub id: Option<DocumentId>,
    /// Headline.
    pub title: String,
    /// Teaser shown in lists.
    pub excerpt: String,
    /// When the article was last written.
    pub update_date: DateTime<Utc>,
    /// The category the article is filed under.
    pub category: Option<DocumentId>,
    /// Publication status.
    pub status: Status,
    /// When the article was first created.
    pub creation_date: DateTime<Utc>,
    /// Introduction as rich text.
    pub text: String,
    /// Mandatory cover image.
    pub image: Image,
    /// Ordered chapters with their change tags.
    pub chapters: ChapterList,
}

impl Default for Article {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title: String::new(),
            excerpt: String::new(),
            update_date: now,
            category: None,
            status: Status::Concept,
            creation_date: now,
            text: String::new(),
            image: Image::default(),
            chapters: ChapterList::default(),
        }
    }
}

impl Article {
    /// The list projection of this article, if it has been persisted.
    #[must_use]
    pub fn item(&self) -> Option<ArticleItem> {
        Some(ArticleItem {
            id: self.id.clone()?,
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            update_date: self.update_date,
            category: self.category.clone(),
            status: self.status,
            image: Image::stored(self.image.url.clone()),
        })
    }
}

impl Validate for Article {
    fn validate_into(&self, v: &mut Validator<'_>) {
        Headline::Article.validate_into(
            v,
            &self.title,
            &self.excerpt,
            self.category.as_ref(),
            &self.text,
        );
        v.nested("image", &self.image);

        // Chapters are optional, but the ones that stay must be valid.
        v.each(
            "chapters",
            self.chapters
                .live()
                .map(|(index, entry)| (index, &entry.chapter)),
        );
    }
}

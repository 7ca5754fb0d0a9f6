use chrono::{DateTime, Utc};

use crate::{
    domain::{DocumentId, Status},
    validation::{Validate, Validator},
};

/// The list projection of a news item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    /// Store id.
    pub id: DocumentId,
    /// Headline.
    pub title: String,
    /// Teaser shown in lists.
    pub excerpt: String,
    /// When the item was last written.
    pub update_date: DateTime<Utc>,
    /// The category the item is filed under.
    pub category: Option<DocumentId>,
    /// Publication status.
    pub status: Status,
}

/// A full news item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct News {
    /// Store id, `None` until created.
    pub id: Option<DocumentId>,
    /// Headline.
    pub title: String,
    /// Teaser shown in lists.
    pub excerpt: String,
    /// When the item was last written.
    pub update_date: DateTime<Utc>,
    /// The category the item is filed under.
    pub category: Option<DocumentId>,
    /// Publication status.
    pub status: Status,
    /// When the item was first created.
    pub creation_date: DateTime<Utc>,
    /// Body as rich text.
    pub text: String,
}

impl Default for News {
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
        }
    }
}

impl News {
    /// The list projection of this item, if it has been persisted.
    #[must_use]
    pub fn item(&self) -> Option<NewsItem> {
        Some(NewsItem {
            id: self.id.clone()?,
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            update_date: self.update_date,
            category: self.category.clone(),
            status: self.status,
        })
    }
}

/// Which kind of publication a set of headline fields belongs to.
///
/// News items and articles share their headline rules and differ only in
/// wording.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Headline {
    News,
    Article,
}

impl Headline {
    const fn messages(self) -> HeadlineMessages {
        match self {
            Self::News => HeadlineMessages {
                title_required: "A news item must have a title.",
                title_length: "The title of a news item has a length between 5 and 50 characters",
                excerpt_required: "A news item must have an excerpt.",
                excerpt_length: "The excerpt of a news item is between 25 and 200 characters of length.",
                category_required: "Each news item must be assigned to a category.",
                text_required: "A news item always has some content.",
            },
            Self::Article => HeadlineMessages {
                title_required: "An article must have a title.",
                title_length: "The title of an article has a length between 5 and 50 characters",
                excerpt_required: "An article must have an excerpt.",
                excerpt_length: "The excerpt of an article is between 25 and 200 characters of length.",
                category_required: "Each article must be assigned to a category.",
                text_required: "An article always has some content.",
            },
        }
    }

    /// Checks title, excerpt, category and text.
    pub(crate) fn validate_into(
        self,
        v: &mut Validator<'_>,
        title: &str,
        excerpt: &str,
        category: Option<&DocumentId>,
        text: &str,
    ) {
        let m = self.messages();
        v.field("title", title)
            .required(m.title_required)
            .min_len(5, m.title_length)
            .max_len(50, m.title_length);
        v.field("excerpt", excerpt)
            .required(m.excerpt_required)
            .min_len(25, m.excerpt_length)
            .max_len(200, m.excerpt_length);
        v.field("category", category.map_or("", DocumentId::as_str))
            .required(m.category_required);
        v.field("text", text).required_rich_text(m.text_required);
    }
}

struct HeadlineMessages {
    title_required: &'static str,
    title_length: &'static str,
    excerpt_required: &'static str,
    excerpt_length: &'static str,
    category_required: &'static str,
    text_required: &'static str,
}

impl Validate for News {
    fn validate_into(&self, v: &mut Validator<'_>) {
        Headline::News.validate_into(
            v,
            &self.title,
            &self.excerpt,
            self.category.as_ref(),
            &self.text,
        );
    }
}

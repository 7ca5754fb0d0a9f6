//! Read-only projections for the public pages.
//!
//! The service lists are ordered newest first, so "latest" always means the
//! first matching entry.

use crate::domain::{ArticleItem, Category, DocumentId, NewsItem};

/// One news item on the news overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsEntry {
    /// The item.
    pub item: NewsItem,
    /// Whether this is the most recently written item of all.
    pub latest: bool,
}

/// A category heading with its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<T> {
    /// The category.
    pub category: Category,
    /// Entries filed under it, newest first.
    pub entries: Vec<T>,
}

fn filed_under(category: &Category, item: Option<&DocumentId>) -> bool {
    category.id.is_some() && category.id.as_ref() == item
}

/// The public news overview: every category with its news items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsOverview {
    /// One section per category, in category order.
    pub sections: Vec<Section<NewsEntry>>,
}

impl NewsOverview {
    /// Groups `items` by category. Categories without items are kept so the
    /// page can show them as empty.
    #[must_use]
    pub fn build(categories: &[Category], items: &[NewsItem]) -> Self {
        let latest = items.first().map(|item| &item.id);
        let sections = categories
            .iter()
            .map(|category| Section {
                category: category.clone(),
                entries: items
                    .iter()
                    .filter(|item| filed_under(category, item.category.as_ref()))
                    .map(|item| NewsEntry {
                        item: item.clone(),
                        latest: Some(&item.id) == latest,
                    })
                    .collect(),
            })
            .collect();
        Self { sections }
    }
}

/// The public article overview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleOverview {
    /// The most recent published article, shown on top.
    pub latest: Option<ArticleItem>,
    /// The other published articles per category.
    pub sections: Vec<Section<ArticleItem>>,
}

impl ArticleOverview {
    /// Builds the overview from the article list. Concepts are left out.
    #[must_use]
    pub fn build(categories: &[Category], items: &[ArticleItem]) -> Self {
        let latest = items.iter().find(|item| item.status.is_public()).cloned();
        let latest_id = latest.as_ref().map(|item| &item.id);

        let sections = categories
            .iter()
            .map(|category| Section {
                category: category.clone(),
                entries: items
                    .iter()
                    .filter(|item| item.status.is_public())
                    .filter(|item| Some(&item.id) != latest_id)
                    .filter(|item| filed_under(category, item.category.as_ref()))
                    .cloned()
                    .collect(),
            })
            .collect();

        Self { latest, sections }
    }
}

/// The home page: the most recent news and published articles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomePage {
    /// Newest news items.
    pub news: Vec<NewsItem>,
    /// Newest published articles.
    pub articles: Vec<ArticleItem>,
}

impl HomePage {
    /// Takes at most `limit` entries of each list.
    #[must_use]
    pub fn build(news: &[NewsItem], articles: &[ArticleItem], limit: usize) -> Self {
        Self {
            news: news.iter().take(limit).cloned().collect(),
            articles: articles
                .iter()
                .filter(|item| item.status.is_public())
                .take(limit)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{Image, Status};

    fn id(value: &str) -> DocumentId {
        DocumentId::new(value).unwrap()
    }

    fn category(value: &str) -> Category {
        Category {
            id: Some(id(value)),
            name: value.to_string(),
        }
    }

    fn news(value: &str, category: &str) -> NewsItem {
        NewsItem {
            id: id(value),
            title: value.to_string(),
            excerpt: String::new(),
            update_date: Utc::now(),
            category: Some(id(category)),
            status: Status::Concept,
        }
    }

    fn article(value: &str, category: &str, status: Status) -> ArticleItem {
        ArticleItem {
            id: id(value),
            title: value.to_string(),
            excerpt: String::new(),
            update_date: Utc::now(),
            category: Some(id(category)),
            status,
            image: Image::stored("https://cdn.example/cover"),
        }
    }

    #[test]
    fn news_is_grouped_and_the_first_is_flagged() {
        let categories = [category("sports"), category("economy"), category("culture")];
        let items = [news("n3", "sports"), news("n2", "economy"), news("n1", "sports")];

        let overview = NewsOverview::build(&categories, &items);

        let sports = &overview.sections[0];
        let flags: Vec<_> = sports
            .entries
            .iter()
            .map(|e| (e.item.id.as_str(), e.latest))
            .collect();
        assert_eq!(flags, vec![("n3", true), ("n1", false)]);
        assert_eq!(overview.sections[1].entries.len(), 1);
        assert!(!overview.sections[1].entries[0].latest);
        assert!(overview.sections[2].entries.is_empty());
    }

    #[test]
    fn article_overview_shows_only_published_articles() {
        let categories = [category("sports"), category("economy")];
        let items = [
            article("a4", "sports", Status::Concept),
            article("a3", "economy", Status::Current),
            article("a2", "sports", Status::Current),
            article("a1", "economy", Status::Current),
        ];

        let overview = ArticleOverview::build(&categories, &items);

        assert_eq!(overview.latest.map(|a| a.id), Some(id("a3")));
        let ids = |i: usize| -> Vec<String> {
            overview.sections[i]
                .entries
                .iter()
                .map(|a| a.id.to_string())
                .collect()
        };
        assert_eq!(ids(0), vec!["a2"]);
        assert_eq!(ids(1), vec!["a1"]);
    }

    #[test]
    fn article_overview_without_published_articles_is_empty() {
        let categories = [category("sports")];
        let items = [article("a1", "sports", Status::Concept)];

        let overview = ArticleOverview::build(&categories, &items);
        assert_eq!(overview.latest, None);
        assert!(overview.sections[0].entries.is_empty());
    }

    #[test]
    fn home_page_limits_both_lists() {
        let news_items = [news("n3", "x"), news("n2", "x"), news("n1", "x")];
        let articles = [
            article("a3", "x", Status::Concept),
            article("a2", "x", Status::Current),
            article("a1", "x", Status::Current),
        ];

        let home = HomePage::build(&news_items, &articles, 2);
        assert_eq!(home.news.len(), 2);
        let ids: Vec<_> = home.articles.iter().map(|a| a.id.to_string()).collect();
        assert_eq!(ids, vec!["a2", "a1"]);
    }
}

//! The pages of the site and the paths they are served under.

use std::fmt;

/// A page of the public site or the CMS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Route {
    /// Latest news and articles.
    #[default]
    Home,
    /// Public article overview.
    Articles,
    /// Public news overview.
    News,
    /// Category management.
    CmsCategories,
    /// News management.
    CmsNews,
    /// Article list in the CMS.
    CmsArticles,
    /// The article editor.
    CmsArticleEdit,
}

impl Route {
    /// Every route, in menu order.
    pub const ALL: [Self; 7] = [
        Self::Home,
        Self::Articles,
        Self::News,
        Self::CmsCategories,
        Self::CmsNews,
        Self::CmsArticles,
        Self::CmsArticleEdit,
    ];

    /// The path of the route, with a leading slash.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/home",
            Self::Articles => "/articles",
            Self::News => "/news",
            Self::CmsCategories => "/cms/categories",
            Self::CmsNews => "/cms/news",
            Self::CmsArticles => "/cms/articles",
            Self::CmsArticleEdit => "/cms/article/edit",
        }
    }

    /// Resolves a path. Unknown paths resolve to [`Route::Home`].
    ///
    /// The leading and trailing slashes are optional.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim_matches('/');
        Self::ALL
            .into_iter()
            .find(|route| route.path().trim_start_matches('/') == trimmed)
            .unwrap_or_else(|| {
                tracing::debug!(path, "Unknown route, redirecting home");
                Self::Home
            })
    }

    /// Whether the route belongs to the CMS.
    #[must_use]
    pub const fn is_cms(self) -> bool {
        matches!(
            self,
            Self::CmsCategories | Self::CmsNews | Self::CmsArticles | Self::CmsArticleEdit
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

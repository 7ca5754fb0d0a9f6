//! Helpers for the HTML produced by the rich-text editor.

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Strips every markup tag, leaving the visible characters.
#[must_use]
pub fn plain_text(html: &str) -> String {
    TAG.replace_all(html, "").into_owned()
}

/// Whether the content has no visible characters.
///
/// An editor that had text typed and then removed leaves markup such as
/// `<p></p>` behind; that counts as blank.
#[must_use]
pub fn is_blank(html: &str) -> bool {
    plain_text(html).trim().is_empty()
}

/// Normalizes blank content to the empty string.
#[must_use]
pub fn normalize(html: String) -> String {
    if is_blank(&html) { String::new() } else { html }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("", true; "empty")]
    #[test_case("<p></p>", true; "empty paragraph")]
    #[test_case("<p> <br></p>", true; "whitespace only")]
    #[test_case("<p>Hi</p>", false; "text")]
    #[test_case("plain", false; "no markup")]
    fn blankness(html: &str, blank: bool) {
        assert_eq!(is_blank(html), blank);
    }

    #[test]
    fn plain_text_keeps_visible_characters() {
        assert_eq!(plain_text("<h1>Title</h1><p>Body <b>bold</b></p>"), "TitleBody bold");
    }

    #[test]
    fn normalize_clears_leftover_markup() {
        assert_eq!(normalize("<p></p>".to_string()), "");
        assert_eq!(normalize("<p>x</p>".to_string()), "<p>x</p>");
    }
}

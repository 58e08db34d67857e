// src/scan/html.rs
// =============================================================================
// This module extracts links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Links are kept as written in the page. They are NOT resolved against the
// page URL: the manager needs the original text for exclusion patterns and
// the validators resolve them themselves.
// =============================================================================

use scraper::{Html, Selector};

use super::is_checkable;

// (selector, attribute) pairs that reference another resource
const LINK_SOURCES: [(&str, &str); 3] = [("a[href]", "href"), ("img[src]", "src"), ("link[href]", "href")];

// Extracts all links from HTML content, in document order per element kind
//
// Example:
//   html = "<a href='/docs'>Docs</a><img src='logo.png'>"
//   result = ["/docs", "logo.png"]
pub fn extract_html_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for (css, attribute) in LINK_SOURCES {
        // The selectors are constants and known to be valid
        let selector = Selector::parse(css).unwrap();

        links.extend(
            document
                .select(&selector)
                .filter_map(|element| element.value().attr(attribute))
                .map(str::trim)
                .filter(|link| is_checkable(link))
                .map(str::to_string),
        );
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<a href="https://www.rust-lang.org">Rust</a>"#;
        let links = extract_html_links(html);
        assert_eq!(links, vec!["https://www.rust-lang.org"]);
    }

    #[test]
    fn test_relative_link_is_kept_as_written() {
        let html = r#"<a href="/docs">Docs</a>"#;
        let links = extract_html_links(html);
        assert_eq!(links, vec!["/docs"]);
    }

    #[test]
    fn test_keeps_mailto() {
        let html = r#"<a href="mailto:test@example.com">Email</a>"#;
        let links = extract_html_links(html);
        assert_eq!(links, vec!["mailto:test@example.com"]);
    }

    #[test]
    fn test_multiple_kinds_of_links() {
        let html = r#"
            <link rel="stylesheet" href="style.css">
            <a href="https://rust-lang.org">Rust</a>
            <a href="../about#team">About</a>
            <img src="logo.png">
            <a name="anchor-only-target"></a>
        "#;
        let links = extract_html_links(html);
        assert_eq!(
            links,
            vec!["https://rust-lang.org", "../about#team", "logo.png", "style.css"]
        );
    }

    #[test]
    fn test_skips_empty_and_javascript() {
        let html = r#"<a href="">x</a><a href="  ">y</a><a href="javascript:go()">z</a>"#;
        assert!(extract_html_links(html).is_empty());
    }
}

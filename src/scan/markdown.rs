// src/scan/markdown.rs
// =============================================================================
// This module extracts links from Markdown text.
//
// We use the `pulldown-cmark` crate which:
// - Parses Markdown into events (heading, paragraph, link, etc.)
// - Follows the CommonMark specification
// - Is fast and memory-efficient (it's a streaming parser)
//
// Links are returned exactly as written: relative paths, anchors and
// mailto: links included. Deciding what they mean is the validators' job.
// Raw HTML embedded in the Markdown is handed to the HTML extractor.
// =============================================================================

use pulldown_cmark::{Event, Parser, Tag};

use super::html::extract_html_links;
use super::is_checkable;

// Extracts all link and image destinations from Markdown text
//
// Example input:
//   "See [the guide](guide.md#setup) and ![logo](img/logo.png)"
//
// Example output:
//   vec!["guide.md#setup", "img/logo.png"]
pub fn extract_markdown_links(markdown: &str) -> Vec<String> {
    let mut links = Vec::new();

    for event in Parser::new(markdown) {
        match event {
            // In pulldown-cmark 0.9, Link is Tag::Link(link_type, dest_url, title)
            Event::Start(Tag::Link(_, dest_url, _)) | Event::Start(Tag::Image(_, dest_url, _)) => {
                let url = dest_url.trim();
                if is_checkable(url) {
                    links.push(url.to_string());
                }
            }

            Event::Html(html) => links.extend(extract_html_links(&html)),

            _ => {}
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_link() {
        let markdown = "Check out [Rust](https://www.rust-lang.org)!";
        let links = extract_markdown_links(markdown);
        assert_eq!(links, vec!["https://www.rust-lang.org"]);
    }

    #[test]
    fn test_extract_multiple_links() {
        let markdown = r#"
# Resources

- [Rust](https://www.rust-lang.org)
- [Cargo](https://doc.rust-lang.org/cargo/)
- [Docs](https://doc.rust-lang.org/)
        "#;
        let links = extract_markdown_links(markdown);
        assert_eq!(links.len(), 3);
        assert!(links.contains(&"https://www.rust-lang.org".to_string()));
    }

    #[test]
    fn test_keeps_relative_mail_and_anchor_links() {
        let markdown = "[docs](./docs/README.md) [mail](mailto:test@example.com) [up](#top)";
        let links = extract_markdown_links(markdown);
        assert_eq!(
            links,
            vec!["./docs/README.md", "mailto:test@example.com", "#top"]
        );
    }

    #[test]
    fn test_images_and_reference_links() {
        let markdown = "![logo](img/logo.png)\n\n[ref][1]\n\n[1]: https://example.com/ref";
        let links = extract_markdown_links(markdown);
        assert_eq!(links, vec!["img/logo.png", "https://example.com/ref"]);
    }

    #[test]
    fn test_embedded_html() {
        let markdown = "Intro\n\n<a href=\"https://example.com/raw\">raw</a>\n";
        let links = extract_markdown_links(markdown);
        assert_eq!(links, vec!["https://example.com/raw"]);
    }

    #[test]
    fn test_skips_javascript_links() {
        let markdown = "[click](javascript:void(0))";
        assert!(extract_markdown_links(markdown).is_empty());
    }
}

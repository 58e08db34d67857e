// src/checker/anchors.rs
// =============================================================================
// In-page anchor lookup.
//
// An anchor "#intro" exists in a page when some element carries
// id="intro", or an <a> element carries name="intro" (the pre-HTML5 way).
// The page is parsed with `scraper`, so attribute quoting, case and
// whitespace are handled the way a browser would.
// =============================================================================

use scraper::{Html, Selector};
use url::form_urlencoded;

/// Returns true if `html` defines the anchor `anchor`.
pub fn contains_anchor(html: &str, anchor: &str) -> bool {
    if anchor.is_empty() {
        return true;
    }

    // "#top" is defined by every HTML page
    if anchor.eq_ignore_ascii_case("top") {
        return true;
    }

    let decoded = decode_anchor(anchor);
    let document = Html::parse_document(html);

    // Both selectors are constants; a parse failure would be a programmer error
    let with_id = Selector::parse("[id]").unwrap();
    let named_links = Selector::parse("a[name]").unwrap();

    let id_match = document
        .select(&with_id)
        .filter_map(|element| element.value().attr("id"))
        .any(|id| id == anchor || id == decoded);

    id_match
        || document
            .select(&named_links)
            .filter_map(|element| element.value().attr("name"))
            .any(|name| name == anchor || name == decoded)
}

// "%C3%A9t%C3%A9" -> "été"; malformed escapes are kept as-is
fn decode_anchor(anchor: &str) -> String {
    if !anchor.contains('%') {
        return anchor.to_string();
    }
    // form_urlencoded also turns '+' into a space, which anchors never mean
    let protected = anchor.replace('+', "%2B");
    form_urlencoded::parse(format!("a={}", protected).as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| anchor.to_string())
}

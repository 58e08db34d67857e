// src/checker/pattern.rs
// =============================================================================
// Glob-style exclusion patterns.
//
// Rules:
// - A link and a pattern that only differ by a trailing '/' are equal
// - A pattern without wildcards is an exact match
// - A pattern ending in '/' is a prefix match
// - '*' matches any run of characters, '/' included. '**' is the same
//   wildcard, written that way when a pattern spans several path segments
// - Matching is anchored at the start of both strings
//
// The matcher knows nothing about URLs: it compares characters. Each pattern
// is compiled once into an anchored regular expression with the `regex`
// crate; everything that is not a '*' is escaped and matched literally.
// =============================================================================

use regex::Regex;

/// A compiled exclusion pattern.
#[derive(Debug, Clone)]
pub struct ExcludePattern {
    raw: String,
    regex: Regex,
}

impl ExcludePattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let trimmed = pattern.trim_end_matches('/');
        let is_prefix = pattern.ends_with('/');

        let mut source = String::with_capacity(trimmed.len() + 16);
        source.push('^');
        source.push_str(&translate(trimmed));
        if is_prefix {
            // "http://host/" also covers everything below http://host
            source.push_str("(?:/.*)?");
        } else {
            source.push_str("/?");
        }
        source.push('$');

        Ok(Self {
            raw: pattern.to_string(),
            regex: Regex::new(&source)?,
        })
    }

    /// The pattern as it was configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, link: &str) -> bool {
        let trimmed = link.trim_end_matches('/');
        // "http://host" must match "http://host/*": retry with the slash put back
        self.regex.is_match(trimmed) || self.regex.is_match(&format!("{}/", trimmed))
    }
}

/// Decides whether `link` matches the exclusion `pattern`.
pub fn matches(link: &str, pattern: &str) -> bool {
    ExcludePattern::new(pattern)
        .map(|compiled| compiled.matches(link))
        .unwrap_or(false)
}

// Turns the glob into a regex body: any run of '*' becomes '.*',
// everything in between is escaped.
fn translate(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2);
    let mut literal = String::new();
    let mut chars = glob.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '*' {
            out.push_str(&regex::escape(&literal));
            literal.clear();
            while chars.peek() == Some(&'*') {
                chars.next();
            }
            out.push_str(".*");
        } else {
            literal.push(c);
        }
    }
    out.push_str(&regex::escape(&literal));

    out
}

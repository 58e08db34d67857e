// src/checker/result.rs
// =============================================================================
// The data model shared by every validator:
// - LinkValidationItem: one link occurrence as written in a document
// - Level: the severity of a validation outcome
// - LinkValidationResult: what a validator reports about a link
//
// Results are plain values. Once a validator builds one it is never mutated,
// which is what lets the manager hand the same cached result to every
// occurrence of a resource.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// One link occurrence, exactly as it was written in its source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkValidationItem {
    /// The link text (href / markdown destination), unresolved
    pub link: String,
    /// The document the link was found in. Only used for diagnostics.
    pub source: String,
}

impl LinkValidationItem {
    pub fn new(link: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            source: source.into(),
        }
    }
}

/// Severity of a validation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// The link resolves
    Valid,
    /// The link resolves but something looks off (redirect, missing base URL)
    Warning,
    /// The link is broken
    Error,
    /// The link was not checked (excluded, or no validator for it)
    Unknown,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Valid => "VALID",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status line of the HTTP response a result was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpStatusLine {
    pub code: u16,
    pub text: String,
    /// URL that answered with this status
    pub url: String,
}

/// The outcome of validating one link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkValidationResult {
    pub level: Level,
    /// False for pseudo-links with no network meaning (mail addresses,
    /// in-page anchors) and for pages whose requested anchor is missing
    pub reachable: bool,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub message: String,
    /// Only set by the HTTP validator
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub http: Option<HttpStatusLine>,
}

impl LinkValidationResult {
    pub fn new(level: Level, reachable: bool, message: impl Into<String>) -> Self {
        Self {
            level,
            reachable,
            message: message.into(),
            http: None,
        }
    }

    /// Result carrying the status line of an HTTP response.
    pub fn http(level: Level, reachable: bool, status: HttpStatusLine) -> Self {
        Self {
            level,
            reachable,
            message: format!("{} {}", status.code, status.text).trim_end().to_string(),
            http: Some(status),
        }
    }

    pub fn valid() -> Self {
        Self::new(Level::Valid, true, "")
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, false, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(Level::Unknown, false, message)
    }

    pub fn status_code(&self) -> Option<u16> {
        self.http.as_ref().map(|status| status.code)
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

/// A link occurrence together with its validation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReport {
    #[serde(flatten)]
    pub item: LinkValidationItem,
    pub result: LinkValidationResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_serializes_upper_case() {
        let json = serde_json::to_string(&Level::Warning).unwrap();
        assert_eq!(json, "\"WARNING\"");
    }

    #[test]
    fn test_http_result_message_uses_status_line() {
        let result = LinkValidationResult::http(
            Level::Error,
            false,
            HttpStatusLine {
                code: 404,
                text: "Not Found".to_string(),
                url: "https://example.com/missing".to_string(),
            },
        );
        assert_eq!(result.message, "404 Not Found");
        assert_eq!(result.status_code(), Some(404));
        assert!(result.is_error());
    }

    #[test]
    fn test_plain_result_omits_http_in_json() {
        let json = serde_json::to_value(LinkValidationResult::valid()).unwrap();
        assert_eq!(json["level"], "VALID");
        assert!(json.get("http").is_none());
        assert!(json.get("message").is_none());
    }
}

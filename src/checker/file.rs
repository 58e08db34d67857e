// src/checker/file.rs
// =============================================================================
// Links to local files: "guide.md", "../img/logo.png", "file:///tmp/a.html".
//
// Relative links are resolved against the directory of the document they
// appear in. Resolution goes through file:// URLs so that "..", percent
// escapes, queries and fragments are handled by the `url` crate.
// =============================================================================

use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use url::Url;

use super::anchors::contains_anchor;
use super::http::split_anchor;
use super::result::{Level, LinkValidationItem, LinkValidationResult};
use super::validator::LinkValidator;

#[derive(Debug, Default, Clone, Copy)]
pub struct FileLinkValidator;

impl FileLinkValidator {
    pub fn new() -> Self {
        Self
    }

    /// Absolute path of the file `item` points at.
    pub fn resolve(&self, item: &LinkValidationItem) -> Option<PathBuf> {
        let target = if item.link.starts_with("file:") {
            Url::parse(&item.link).ok()?
        } else {
            source_dir_url(&item.source)?.join(&item.link).ok()?
        };
        target.to_file_path().ok()
    }
}

// file:// URL of the directory holding `source`, with a trailing slash so
// that join() resolves relative to it
fn source_dir_url(source: &str) -> Option<Url> {
    let dir = Path::new(source).parent().unwrap_or_else(|| Path::new(""));
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(dir)
    };
    Url::from_directory_path(dir).ok()
}

fn is_html(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("html") | Some("htm")
    )
}

#[async_trait]
impl LinkValidator for FileLinkValidator {
    fn resource_key(&self, item: &LinkValidationItem) -> Option<String> {
        self.resolve(item)
            .map(|path| path.to_string_lossy().into_owned())
    }

    async fn validate_resource(&self, item: &LinkValidationItem) -> LinkValidationResult {
        let path = match self.resolve(item) {
            Some(path) => path,
            None => return LinkValidationResult::error(format!("Malformed file link '{}'", item.link)),
        };

        match tokio::fs::metadata(&path).await {
            Ok(_) => LinkValidationResult::valid(),
            Err(e) => {
                debug!("Cannot access [{}] from [{}]: {}", path.display(), item.source, e);
                LinkValidationResult::error(format!("File not found: {}", path.display()))
            }
        }
    }

    async fn check_fragment(
        &self,
        item: &LinkValidationItem,
        resource: &LinkValidationResult,
    ) -> LinkValidationResult {
        let anchor = match split_anchor(&item.link) {
            (_, Some(anchor)) if !anchor.is_empty() => anchor,
            _ => return resource.clone(),
        };
        if resource.level != Level::Valid {
            return resource.clone();
        }

        // Only HTML pages have anchors we know how to look up
        let path = match self.resolve(item) {
            Some(path) if is_html(&path) => path,
            _ => return resource.clone(),
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(content) if contains_anchor(&content, anchor) => resource.clone(),
            Ok(_) => LinkValidationResult::new(
                Level::Valid,
                false,
                format!("Missing anchor '{}'", anchor),
            ),
            Err(e) => LinkValidationResult::error(format!("Cannot read {}: {}", path.display(), e)),
        }
    }
}

// src/scan/mod.rs
// =============================================================================
// This module finds the links to validate in local documents.
//
// How it works:
// 1. Walk the files and directories given on the command line
// 2. Keep Markdown (.md, .markdown) and HTML (.html, .htm) documents
// 3. Extract every link from each document, as written
// 4. Pair each link with the document it came from
//
// Directory walking is recursive and sorted, so the same tree always yields
// the same items in the same order.
// =============================================================================

mod html;
mod markdown;

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::checker::LinkValidationItem;

pub use html::extract_html_links;
pub use markdown::extract_markdown_links;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Markdown,
    Html,
}

impl DocumentKind {
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" => Some(DocumentKind::Markdown),
            "html" | "htm" => Some(DocumentKind::Html),
            _ => None,
        }
    }
}

/// Whether a link is worth handing to the validators at all.
pub(crate) fn is_checkable(link: &str) -> bool {
    let lower = link.to_ascii_lowercase();
    !link.is_empty() && !lower.starts_with("javascript:") && !lower.starts_with("data:")
}

/// Every link in every document under `roots`.
pub fn scan_paths(roots: &[PathBuf]) -> Result<Vec<LinkValidationItem>> {
    let mut items = Vec::new();

    for document in collect_documents(roots)? {
        match scan_document(&document) {
            Ok(found) => {
                debug!("{} link(s) found in {}", found.len(), document.display());
                items.extend(found);
            }
            Err(e) => warn!("Skipping {}: {:#}", document.display(), e),
        }
    }

    Ok(items)
}

/// The links of one document, paired with the document's path.
pub fn scan_document(path: &Path) -> Result<Vec<LinkValidationItem>> {
    let kind = DocumentKind::of(path)
        .with_context(|| format!("{} is not a Markdown or HTML document", path.display()))?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let links = match kind {
        DocumentKind::Markdown => extract_markdown_links(&content),
        DocumentKind::Html => extract_html_links(&content),
    };

    let source = path.to_string_lossy().into_owned();
    Ok(links
        .into_iter()
        .map(|link| LinkValidationItem::new(link, source.clone()))
        .collect())
}

/// Documents under `roots`: files given directly are kept if they are
/// documents, directories are walked recursively.
pub fn collect_documents(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();

    for root in roots {
        let metadata = fs::metadata(root)
            .with_context(|| format!("cannot read {}", root.display()))?;

        if metadata.is_dir() {
            walk(root, &mut documents)?;
        } else if DocumentKind::of(root).is_some() {
            documents.push(root.clone());
        } else {
            warn!("{} is not a Markdown or HTML document, ignoring it", root.display());
        }
    }

    Ok(documents)
}

fn walk(dir: &Path, documents: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("cannot list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect::<Vec<_>>();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk(&path, documents)?;
        } else if DocumentKind::of(&path).is_some() {
            documents.push(path);
        }
    }

    Ok(())
}

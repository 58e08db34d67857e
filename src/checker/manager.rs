// src/checker/manager.rs
// =============================================================================
// The validator manager: the entry point of link validation.
//
// For every link occurrence it:
// 1. Skips the link if its host or the link itself is excluded
// 2. Picks the validator registered for the link's scheme
// 3. Returns the cached result if the link's resource was already checked
// 4. Otherwise validates the resource and caches the result
// 5. Lets the validator refine the result for this occurrence (anchors)
//
// The cache maps resource keys to a OnceCell. The cell is inserted before
// the validator runs, so concurrent occurrences of the same resource wait
// for the first validation instead of starting their own: at most one
// validation per resource key is ever in flight.
//
// The cache lives as long as the manager, i.e. one run.
// =============================================================================

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use url::Url;

use super::file::FileLinkValidator;
use super::http::HttpLinkValidator;
use super::mail::MailtoLinkValidator;
use super::pattern::ExcludePattern;
use super::result::{LinkReport, LinkValidationItem, LinkValidationResult};
use super::settings::HttpSettings;
use super::validator::LinkValidator;

/// Scheme under which local file links are dispatched.
pub const FILE_SCHEME: &str = "file";

type CacheCell = Arc<OnceCell<LinkValidationResult>>;

#[derive(Default)]
pub struct LinkValidatorManager {
    validators: HashMap<String, Arc<dyn LinkValidator>>,
    excluded_hosts: Vec<ExcludePattern>,
    excluded_links: Vec<ExcludePattern>,
    cache: Mutex<HashMap<String, CacheCell>>,
}

impl LinkValidatorManager {
    /// A manager with no validators and no exclusions.
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager with the HTTP, mail and file validators registered.
    pub fn with_default_validators(settings: HttpSettings) -> Result<Self> {
        let http: Arc<dyn LinkValidator> = Arc::new(HttpLinkValidator::new(settings)?);

        let mut manager = Self::new();
        manager.register("http", http.clone());
        manager.register("https", http);
        manager.register("mailto", Arc::new(MailtoLinkValidator::new()));
        manager.register(FILE_SCHEME, Arc::new(FileLinkValidator::new()));
        Ok(manager)
    }

    /// Registers `validator` for links of `scheme`, replacing any previous one.
    pub fn register(&mut self, scheme: &str, validator: Arc<dyn LinkValidator>) {
        self.validators
            .insert(scheme.to_ascii_lowercase(), validator);
    }

    pub fn exclude_host(&mut self, host: &str) -> Result<()> {
        let pattern = ExcludePattern::new(&host.to_ascii_lowercase())
            .with_context(|| format!("invalid excluded host '{}'", host))?;
        self.excluded_hosts.push(pattern);
        Ok(())
    }

    pub fn exclude_pattern(&mut self, pattern: &str) -> Result<()> {
        let compiled = ExcludePattern::new(pattern)
            .with_context(|| format!("invalid exclude pattern '{}'", pattern))?;
        self.excluded_links.push(compiled);
        Ok(())
    }

    /// Validates one link occurrence. Never fails: every outcome is a result.
    pub async fn validate(&self, item: &LinkValidationItem) -> LinkValidationResult {
        if let Some(rule) = self.exclusion(item) {
            debug!("Skipping [{}] in page [{}]: excluded by '{}'", item.link, item.source, rule);
            return LinkValidationResult::unknown("excluded");
        }

        let scheme = match scheme_of(&item.link) {
            Some(scheme) => scheme,
            None => return LinkValidationResult::unknown("Not a resolvable link"),
        };

        let validator = match self.validators.get(&scheme) {
            Some(validator) => validator,
            None => {
                debug!("No validator for [{}] in page [{}]", item.link, item.source);
                return LinkValidationResult::unknown(format!("Unsupported scheme '{}'", scheme));
            }
        };

        let resource = match validator.resource_key(item) {
            Some(key) => {
                let cell = self.cache_cell(&key).await;
                if cell.initialized() {
                    debug!("Using cached result for [{}]", key);
                }
                cell.get_or_init(|| validator.validate_resource(item))
                    .await
                    .clone()
            }
            None => validator.validate_resource(item).await,
        };

        validator.check_fragment(item, &resource).await
    }

    /// Validates `items` with up to `concurrency` validations in flight.
    /// Reports come back in input order.
    pub async fn validate_all(
        &self,
        items: Vec<LinkValidationItem>,
        concurrency: usize,
    ) -> Vec<LinkReport> {
        let tasks = items.into_iter().map(|item| async move {
            let result = self.validate(&item).await;
            LinkReport { item, result }
        });

        stream::iter(tasks)
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// Number of resources validated (or being validated) so far.
    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Cached result for a resource key, if the resource was validated.
    pub async fn cached(&self, key: &str) -> Option<LinkValidationResult> {
        let cache = self.cache.lock().await;
        cache.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Forgets every cached result, e.g. before starting a new run.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    async fn cache_cell(&self, key: &str) -> CacheCell {
        let mut cache = self.cache.lock().await;
        cache.entry(key.to_string()).or_default().clone()
    }

    // The exclusion rule that applies to `item`, if any
    fn exclusion(&self, item: &LinkValidationItem) -> Option<&str> {
        if let Some(host) = host_of(&item.link) {
            if let Some(rule) = self.excluded_hosts.iter().find(|p| p.matches(&host)) {
                return Some(rule.as_str());
            }
        }

        self.excluded_links
            .iter()
            .find(|p| p.matches(&item.link))
            .map(ExcludePattern::as_str)
    }
}

/// The scheme a link is dispatched on.
///
/// - "#anchor" and "" are pseudo-links: `None`
/// - "/path" and "//host/path" are web links: "http"
/// - "scheme:..." gives the (lower-cased) scheme
/// - anything else is a local file link: "file"
pub fn scheme_of(link: &str) -> Option<String> {
    if link.is_empty() || link.starts_with('#') {
        return None;
    }
    if link.starts_with('/') {
        return Some("http".to_string());
    }

    match link.split_once(':') {
        Some((scheme, _)) if is_scheme(scheme) => Some(scheme.to_ascii_lowercase()),
        _ => Some(FILE_SCHEME.to_string()),
    }
}

// RFC 3986 scheme syntax. Single letters are Windows drive names.
fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    candidate.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

// Lower-cased host of an absolute or protocol-relative link
fn host_of(link: &str) -> Option<String> {
    let parsed = if link.starts_with("//") {
        Url::parse(&format!("https:{}", link))
    } else {
        Url::parse(link)
    };
    parsed
        .ok()?
        .host_str()
        .map(|host| host.to_ascii_lowercase())
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a OnceCell per key instead of storing results directly?
//    - Two tasks can ask for the same URL at the same time
//    - The first one inserts an empty cell and starts the validation
//    - The second finds the cell and awaits it instead of sending a request
//    - get_or_init() runs the initialiser at most once per cell
//
// 2. Why is the cache Mutex only held briefly?
//    - cache_cell() locks, clones the Arc<OnceCell> and unlocks
//    - The (slow) validation then runs without the lock, so different
//      resources are validated in parallel
//
// 3. buffered vs buffer_unordered
//    - Both run up to N futures at once
//    - buffered() yields results in input order, which keeps reports stable
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::result::Level;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // Counts resource validations; keys on the link without its fragment
    #[derive(Default)]
    struct CountingValidator {
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl CountingValidator {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LinkValidator for CountingValidator {
        fn resource_key(&self, item: &LinkValidationItem) -> Option<String> {
            if item.link.contains("nocache") {
                return None;
            }
            Some(item.link.split('#').next().unwrap_or_default().to_string())
        }

        async fn validate_resource(&self, item: &LinkValidationItem) -> LinkValidationResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            LinkValidationResult::new(Level::Valid, true, format!("checked from {}", item.source))
        }

        async fn check_fragment(
            &self,
            item: &LinkValidationItem,
            resource: &LinkValidationResult,
        ) -> LinkValidationResult {
            match item.link.split_once('#') {
                Some((_, anchor)) => LinkValidationResult::new(resource.level, false, anchor),
                None => resource.clone(),
            }
        }
    }

    fn manager_with(validator: Arc<CountingValidator>) -> LinkValidatorManager {
        let mut manager = LinkValidatorManager::new();
        manager.register("http", validator.clone());
        manager.register("https", validator);
        manager
    }

    #[tokio::test]
    async fn test_same_resource_is_validated_once() {
        let validator = Arc::new(CountingValidator::default());
        let manager = manager_with(validator.clone());

        let first = manager
            .validate(&LinkValidationItem::new("https://example.com/", "a.html"))
            .await;
        let second = manager
            .validate(&LinkValidationItem::new("https://example.com/", "b.html"))
            .await;

        assert_eq!(validator.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(second.message, "checked from a.html");
        assert_eq!(manager.cache_len().await, 1);
        assert_eq!(manager.cached("https://example.com/").await, Some(first));
    }

    #[tokio::test]
    async fn test_fragment_is_refined_on_cache_hits() {
        let validator = Arc::new(CountingValidator::default());
        let manager = manager_with(validator.clone());

        let a = manager
            .validate(&LinkValidationItem::new("https://example.com/doc#a", "x.html"))
            .await;
        let b = manager
            .validate(&LinkValidationItem::new("https://example.com/doc#b", "x.html"))
            .await;

        assert_eq!(validator.calls(), 1);
        assert_eq!(a.message, "a");
        assert_eq!(b.message, "b");
    }

    #[tokio::test]
    async fn test_concurrent_occurrences_share_one_validation() {
        let validator = Arc::new(CountingValidator {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let manager = manager_with(validator.clone());

        let items: Vec<LinkValidationItem> = (0..8)
            .map(|i| LinkValidationItem::new("https://slow.example.com/", format!("page{}.html", i)))
            .collect();
        let reports = manager.validate_all(items, 8).await;

        assert_eq!(reports.len(), 8);
        assert_eq!(validator.calls(), 1);
        assert_eq!(reports[7].item.source, "page7.html");
    }

    #[tokio::test]
    async fn test_uncacheable_items_are_validated_every_time() {
        let validator = Arc::new(CountingValidator::default());
        let manager = manager_with(validator.clone());
        let item = LinkValidationItem::new("https://example.com/nocache", "a.html");

        manager.validate(&item).await;
        manager.validate(&item).await;

        assert_eq!(validator.calls(), 2);
        assert_eq!(manager.cache_len().await, 0);
    }

    #[tokio::test]
    async fn test_excluded_host_never_reaches_validator() {
        let validator = Arc::new(CountingValidator::default());
        let mut manager = manager_with(validator.clone());
        manager.exclude_host("Example.COM").unwrap();

        let result = manager
            .validate(&LinkValidationItem::new("https://example.com/page", "a.html"))
            .await;

        assert_eq!(result.level, Level::Unknown);
        assert_eq!(result.message, "excluded");
        assert_eq!(validator.calls(), 0);
        assert_eq!(manager.cache_len().await, 0);
    }

    #[tokio::test]
    async fn test_excluded_host_pattern() {
        let validator = Arc::new(CountingValidator::default());
        let mut manager = manager_with(validator.clone());
        manager.exclude_host("*.internal.net").unwrap();

        let excluded = manager
            .validate(&LinkValidationItem::new("http://wiki.internal.net/x", "a.html"))
            .await;
        let checked = manager
            .validate(&LinkValidationItem::new("http://internal.net.example.org/", "a.html"))
            .await;

        assert_eq!(excluded.level, Level::Unknown);
        assert_eq!(checked.level, Level::Valid);
        assert_eq!(validator.calls(), 1);
    }

    #[tokio::test]
    async fn test_excluded_pattern_never_reaches_validator() {
        let validator = Arc::new(CountingValidator::default());
        let mut manager = manager_with(validator.clone());
        manager.exclude_pattern("http://maven.apache.org/**/*.html").unwrap();

        let excluded = manager
            .validate(&LinkValidationItem::new("http://maven.apache.org/a/b.html", "a.html"))
            .await;
        let checked = manager
            .validate(&LinkValidationItem::new("http://maven.apache.org/a/b.jsp", "a.html"))
            .await;

        assert_eq!(excluded.level, Level::Unknown);
        assert_eq!(checked.level, Level::Valid);
        assert_eq!(validator.calls(), 1);
        assert_eq!(manager.cache_len().await, 1);
    }

    #[tokio::test]
    async fn test_unregistered_scheme_is_unknown() {
        let validator = Arc::new(CountingValidator::default());
        let manager = manager_with(validator.clone());

        let result = manager
            .validate(&LinkValidationItem::new("ftp://files.example.com/a.zip", "a.html"))
            .await;

        assert_eq!(result.level, Level::Unknown);
        assert_eq!(result.message, "Unsupported scheme 'ftp'");
        assert_eq!(validator.calls(), 0);
    }

    #[tokio::test]
    async fn test_anchor_only_link_is_unknown() {
        let manager = LinkValidatorManager::new();

        let result = manager
            .validate(&LinkValidationItem::new("#section", "a.html"))
            .await;

        assert_eq!(result.level, Level::Unknown);
        assert!(!result.reachable);
    }

    #[tokio::test]
    async fn test_mail_links_are_dispatched_to_mail_validator() {
        let mut manager = LinkValidatorManager::new();
        manager.register("mailto", Arc::new(MailtoLinkValidator::new()));

        let result = manager
            .validate(&LinkValidationItem::new("MAILTO:dev@example.com", "a.html"))
            .await;

        assert_eq!(result.level, Level::Valid);
        assert!(!result.reachable);
        assert_eq!(manager.cache_len().await, 1);
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let validator = Arc::new(CountingValidator::default());
        let manager = manager_with(validator.clone());
        let item = LinkValidationItem::new("https://example.com/", "a.html");

        manager.validate(&item).await;
        manager.clear_cache().await;
        manager.validate(&item).await;

        assert_eq!(validator.calls(), 2);
    }

    #[test]
    fn test_scheme_of() {
        assert_eq!(scheme_of("https://example.com"), Some("https".to_string()));
        assert_eq!(scheme_of("HTTP://example.com"), Some("http".to_string()));
        assert_eq!(scheme_of("/docs/"), Some("http".to_string()));
        assert_eq!(scheme_of("//cdn.example.com/x.js"), Some("http".to_string()));
        assert_eq!(scheme_of("mailto:a@b.com"), Some("mailto".to_string()));
        assert_eq!(scheme_of("guide.md"), Some("file".to_string()));
        assert_eq!(scheme_of("../a/b.html#x"), Some("file".to_string()));
        assert_eq!(scheme_of("c:/windows/file.txt"), Some("file".to_string()));
        assert_eq!(scheme_of("#top"), None);
        assert_eq!(scheme_of(""), None);
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://Example.com:8080/x"), Some("example.com".to_string()));
        assert_eq!(host_of("//cdn.example.com/x.js"), Some("cdn.example.com".to_string()));
        assert_eq!(host_of("guide.md"), None);
    }
}

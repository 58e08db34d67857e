// src/checker/http.rs
// =============================================================================
// This module checks if http:// and https:// links are alive.
//
// Key functionality:
// - Resolves site-relative links ("/docs") against a configured base URL
// - Probes the link with HEAD (or GET), one request per redirect hop
// - Follows 301/302/307 redirects itself, up to a configurable bound
// - Verifies in-page anchors ("page.html#intro") on pages that answered 200
// - Turns every transport fault into an ERROR result
//
// Reporting rules:
// - 200                       -> VALID
// - 301/302/307 then ... 200  -> the FIRST redirect is reported (WARNING),
//                                so users learn that the link moved
// - anything else             -> ERROR with the status of the last hop
// =============================================================================

use async_trait::async_trait;
use log::{debug, error, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use url::Url;

use super::anchors::contains_anchor;
use super::result::{HttpStatusLine, Level, LinkValidationItem, LinkValidationResult};
use super::settings::{HttpSettings, ProbeMethod};
use super::transport::{HttpTransport, ProbeRequest, ProbeResponse, ReqwestTransport, TransportError};
use super::validator::LinkValidator;

const STATUS_OK: u16 = 200;

/// Statuses we follow. Other 3xx codes (303, 308) are reported as errors.
const REDIRECT_STATUSES: [u16; 3] = [301, 302, 307];

type PageCell = Arc<OnceCell<Arc<str>>>;

// One answered request of a redirect chase
#[derive(Debug)]
struct Hop {
    url: Url,
    response: ProbeResponse,
}

pub struct HttpLinkValidator {
    settings: HttpSettings,
    method: ProbeMethod,
    max_redirects: usize,
    transport: Arc<dyn HttpTransport>,
    // Page bodies for anchor checks, keyed like the manager's cache
    pages: Mutex<HashMap<String, PageCell>>,
}

impl HttpLinkValidator {
    /// Validator using a real reqwest client configured from `settings`.
    pub fn new(settings: HttpSettings) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(&settings)?;
        Ok(Self::with_transport(settings, Arc::new(transport)))
    }

    pub fn with_transport(settings: HttpSettings, transport: Arc<dyn HttpTransport>) -> Self {
        let method = settings.probe_method();
        debug!("Will use method : [{:?}]", method);

        Self {
            max_redirects: settings.max_redirects(),
            method,
            settings,
            transport,
            pages: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    // "/docs" -> "<base>/docs", "//host/x" -> "https://host/x".
    // None when the link is site-relative and no base URL is configured.
    fn resolve_target(&self, target: &str) -> Option<String> {
        if target.starts_with("//") {
            Some(format!("https:{}", target))
        } else if target.starts_with('/') {
            self.settings
                .base_url()
                .map(|base| format!("{}{}", base, target))
        } else {
            Some(target.to_string())
        }
    }

    async fn probe(&self, method: ProbeMethod, url: Url) -> Result<ProbeResponse, TransportError> {
        let request = ProbeRequest::new(method, url, self.settings.user_agent());
        self.transport.execute(&request).await
    }

    // Follows redirects until a non-redirect status, a redirect without a
    // Location header, or the redirect bound.
    async fn chase(&self, link: &str) -> Result<Hop, TransportError> {
        let mut current = parse_url(link)?;
        let mut first_redirect: Option<Hop> = None;
        let mut redirects = 0;

        loop {
            if redirects > self.max_redirects {
                return Err(TransportError::TooManyRedirects(self.max_redirects));
            }

            let response = self.probe(self.method, current.clone()).await?;

            if !REDIRECT_STATUSES.contains(&response.status) {
                let terminal = Hop {
                    url: current,
                    response,
                };
                return Ok(match first_redirect {
                    Some(first) if terminal.response.status == STATUS_OK => first,
                    _ => terminal,
                });
            }

            let next = match response.location.clone() {
                Some(location) => resolve_location(&current, &location)?,
                None => {
                    error!("Site sent redirect, but did not set Location header");
                    return Ok(Hop {
                        url: current,
                        response,
                    });
                }
            };

            debug!("[{}] is redirected to [{}]", current, next);

            if first_redirect.is_none() {
                first_redirect = Some(Hop {
                    url: current,
                    response,
                });
            }
            current = next;
            redirects += 1;
        }
    }

    async fn page_cell(&self, key: &str) -> PageCell {
        let mut pages = self.pages.lock().await;
        pages.entry(key.to_string()).or_default().clone()
    }

    // Body of the page behind `key`, fetched with GET at most once.
    // A GET that does not answer 200 is the result of the occurrence.
    async fn page_body(&self, key: &str) -> Result<Arc<str>, LinkValidationResult> {
        let cell = self.page_cell(key).await;
        let body = cell
            .get_or_try_init(|| async {
                let url = parse_url(key).map_err(fault_result)?;
                let response = self
                    .probe(ProbeMethod::Get, url.clone())
                    .await
                    .map_err(fault_result)?;

                if response.status != STATUS_OK {
                    return Err(LinkValidationResult::http(
                        Level::Error,
                        false,
                        HttpStatusLine {
                            code: response.status,
                            text: response.reason,
                            url: url.to_string(),
                        },
                    ));
                }

                Ok(Arc::from(response.body.unwrap_or_default()))
            })
            .await?;
        Ok(body.clone())
    }

    async fn remember_page(&self, key: &str, body: String) {
        let cell = self.page_cell(key).await;
        // Already set means another occurrence fetched it first
        let _ = cell.set(Arc::from(body));
    }

    fn classify(&self, item: &LinkValidationItem, link: &str, hop: &Hop) -> LinkValidationResult {
        let status = HttpStatusLine {
            code: hop.response.status,
            text: hop.response.reason.clone(),
            url: hop.url.to_string(),
        };

        if status.code == STATUS_OK {
            return LinkValidationResult::http(Level::Valid, true, status);
        }

        let msg = format!(
            "Received: [{}] for [{}] in page [{}]",
            status.code, link, item.source
        );

        if REDIRECT_STATUSES.contains(&status.code) {
            warn!("{}", msg);
            LinkValidationResult::http(Level::Warning, true, status)
        } else {
            debug!("{}", msg);
            LinkValidationResult::http(Level::Error, false, status)
        }
    }
}

#[async_trait]
impl LinkValidator for HttpLinkValidator {
    fn resource_key(&self, item: &LinkValidationItem) -> Option<String> {
        let (target, _) = split_anchor(&item.link);
        self.resolve_target(target)
    }

    async fn validate_resource(&self, item: &LinkValidationItem) -> LinkValidationResult {
        let (target, _) = split_anchor(&item.link);

        let link = match self.resolve_target(target) {
            Some(link) => link,
            None => {
                warn!(
                    "Cannot check link [{}] in page [{}], as no base URL has been set!",
                    target, item.source
                );
                return LinkValidationResult::new(Level::Warning, false, "No base URL specified");
            }
        };

        match self.chase(&link).await {
            Ok(hop) => {
                let result = self.classify(item, &link, &hop);
                // Keep the body only when this occurrence will look into it
                let wants_anchor = matches!(split_anchor(&item.link), (_, Some(a)) if !a.is_empty());
                if wants_anchor && hop.response.status == STATUS_OK {
                    if let Some(body) = hop.response.body {
                        self.remember_page(&link, body).await;
                    }
                }
                result
            }
            Err(fault) => {
                debug!(
                    "Received: [{}] for [{}] in page [{}]",
                    fault, link, item.source
                );
                fault_result(fault)
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

        // Only a page that answered 200 directly is inspected
        if resource.status_code() != Some(STATUS_OK) {
            return resource.clone();
        }

        let key = match self.resource_key(item) {
            Some(key) => key,
            None => return resource.clone(),
        };

        let body = match self.page_body(&key).await {
            Ok(body) => body,
            Err(result) => {
                debug!(
                    "Could not fetch [{}] to check anchor '{}': {}",
                    key, anchor, result.message
                );
                return result;
            }
        };

        if contains_anchor(&body, anchor) {
            resource.clone()
        } else {
            LinkValidationResult {
                level: Level::Valid,
                reachable: false,
                message: format!("Missing anchor '{}'", anchor),
                http: resource.http.clone(),
            }
        }
    }
}

/// Splits "page.html#intro" into ("page.html", Some("intro")) on the first '#'.
pub fn split_anchor(link: &str) -> (&str, Option<&str>) {
    match link.split_once('#') {
        Some((target, anchor)) => (target, Some(anchor)),
        None => (link, None),
    }
}

fn fault_result(fault: TransportError) -> LinkValidationResult {
    LinkValidationResult::error(format!("{} : {}", fault.category(), fault))
}

fn parse_url(link: &str) -> Result<Url, TransportError> {
    Url::parse(link).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", link, e)))
}

// "http(s)://..." is used as-is, "/path" goes on the origin of `current`,
// anything else is appended to `current` verbatim ("/page" + "next" ->
// "/pagenext").
fn resolve_location(current: &Url, location: &str) -> Result<Url, TransportError> {
    let location = location.trim();

    let next = if location.starts_with("http://") || location.starts_with("https://") {
        location.to_string()
    } else if location.starts_with('/') {
        format!("{}{}", current.origin().ascii_serialization(), location)
    } else {
        format!("{}{}", current, location)
    };

    parse_url(&next)
}

// src/checker/transport.rs
// =============================================================================
// The network seam of the HTTP validator.
//
// HttpTransport sends one request and hands back the parts of the response
// the validator cares about. It never follows redirects on the validator's
// behalf unless the settings ask for it; the validator runs its own bounded
// redirect chase.
//
// ReqwestTransport is the real implementation. It owns a single
// reqwest::Client, so every validation shares one connection pool, and it
// attaches the user agent to each request instead of configuring it
// globally.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{LOCATION, USER_AGENT};
use reqwest::{redirect, Client, Proxy};
use thiserror::Error;
use url::Url;

use super::settings::{HttpSettings, ProbeMethod};

/// A single probe of a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub method: ProbeMethod,
    pub url: Url,
    pub user_agent: String,
}

impl ProbeRequest {
    pub fn new(method: ProbeMethod, url: Url, user_agent: impl Into<String>) -> Self {
        Self {
            method,
            url,
            user_agent: user_agent.into(),
        }
    }
}

/// What came back from a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub reason: String,
    /// Raw value of the Location header
    pub location: Option<String>,
    /// Page content; only read for successful GET requests
    pub body: Option<String>,
}

/// Faults that prevent a probe from producing a response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Malformed URL '{0}'")]
    InvalidUrl(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Maximum number of redirections ({0}) exceeded")]
    TooManyRedirects(usize),

    #[error("Redirect error: {0}")]
    Redirect(String),

    #[error("Could not read response body: {0}")]
    Body(String),

    #[error("{0}")]
    Request(String),
}

impl TransportError {
    /// Short category name, reported in front of the message.
    pub fn category(&self) -> &'static str {
        match self {
            TransportError::InvalidUrl(_) => "InvalidUrlError",
            TransportError::Timeout(_) => "TimeoutError",
            TransportError::Connect(_) => "ConnectError",
            TransportError::TooManyRedirects(_) | TransportError::Redirect(_) => "RedirectError",
            TransportError::Body(_) => "BodyError",
            TransportError::Request(_) => "RequestError",
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        let message = error.to_string();

        if error.is_timeout() {
            TransportError::Timeout(message)
        } else if error.is_redirect() {
            TransportError::Redirect(message)
        } else if error.is_connect() {
            TransportError::Connect(message)
        } else if error.is_builder() {
            TransportError::InvalidUrl(message)
        } else if error.is_body() || error.is_decode() {
            TransportError::Body(message)
        } else {
            TransportError::Request(message)
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &ProbeRequest) -> Result<ProbeResponse, TransportError>;
}

/// HttpTransport backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let policy = if settings.follow_redirects {
            redirect::Policy::limited(settings.max_redirects())
        } else {
            redirect::Policy::none()
        };

        let mut builder = Client::builder().redirect(policy);

        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = settings.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(max) = settings.max_idle_per_host() {
            builder = builder.pool_max_idle_per_host(max);
        }

        match settings.proxy.as_ref().filter(|proxy| !proxy.host.is_empty()) {
            Some(proxy) => {
                debug!("Proxy: {}", proxy.url());
                let mut route = Proxy::all(proxy.url())
                    .with_context(|| format!("invalid proxy '{}'", proxy.url()))?;
                if let Some((user, password)) = proxy.credentials() {
                    debug!("Proxy user: {}", user);
                    route = route.basic_auth(&user, &password);
                }
                builder = builder.proxy(route);
            }
            None => debug!("Not using a proxy"),
        }

        settings.log_unknown_parameters();

        let client = builder.build().context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &ProbeRequest) -> Result<ProbeResponse, TransportError> {
        let response = self
            .client
            .request(request.method.as_reqwest(), request.url.clone())
            .header(USER_AGENT, request.user_agent.as_str())
            .send()
            .await?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = if request.method == ProbeMethod::Get && status.is_success() {
            Some(response.text().await?)
        } else {
            None
        };

        Ok(ProbeResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            location,
            body,
        })
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a trait for something as simple as "send a request"?
//    - The validator only depends on HttpTransport, not on reqwest
//    - Tests plug in a scripted transport and replay exact redirect chains
//      without touching the network
//
// 2. What does #[async_trait] do?
//    - It rewrites `async fn` in traits into methods returning boxed futures
//    - That makes `Arc<dyn HttpTransport>` possible
//
// 3. Why `impl From<reqwest::Error> for TransportError`?
//    - The `?` operator calls From automatically
//    - `.send().await?` turns a reqwest error into our categories for free
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::settings::DEFAULT_USER_AGENT;

    fn probe(method: ProbeMethod, url: &str) -> ProbeRequest {
        ProbeRequest::new(method, Url::parse(url).unwrap(), DEFAULT_USER_AGENT)
    }

    #[tokio::test]
    async fn test_redirects_are_not_followed_by_default() {
        let mut server = mockito::Server::new_async().await;
        let _old = server
            .mock("HEAD", "/old")
            .with_status(301)
            .with_header("location", "/new")
            .create_async()
            .await;

        let transport = ReqwestTransport::new(&HttpSettings::default()).unwrap();
        let response = transport
            .execute(&probe(ProbeMethod::Head, &format!("{}/old", server.url())))
            .await
            .unwrap();

        assert_eq!(response.status, 301);
        assert_eq!(response.reason, "Moved Permanently");
        assert_eq!(response.location.as_deref(), Some("/new"));
        assert_eq!(response.body, None);
    }

    #[tokio::test]
    async fn test_user_agent_is_sent_per_request() {
        let mut server = mockito::Server::new_async().await;
        let page = server
            .mock("HEAD", "/")
            .match_header("user-agent", DEFAULT_USER_AGENT)
            .with_status(200)
            .create_async()
            .await;

        let transport = ReqwestTransport::new(&HttpSettings::default()).unwrap();
        let response = transport
            .execute(&probe(ProbeMethod::Head, &format!("{}/", server.url())))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        page.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_reads_body() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/doc.html")
            .with_status(200)
            .with_body("<h1 id=\"intro\">Intro</h1>")
            .create_async()
            .await;

        let transport = ReqwestTransport::new(&HttpSettings::default()).unwrap();
        let response = transport
            .execute(&probe(ProbeMethod::Get, &format!("{}/doc.html", server.url())))
            .await
            .unwrap();

        assert_eq!(response.body.as_deref(), Some("<h1 id=\"intro\">Intro</h1>"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_a_transport_error() {
        let transport = ReqwestTransport::new(&HttpSettings::default()).unwrap();
        let error = transport
            .execute(&probe(ProbeMethod::Head, "http://127.0.0.1:1/"))
            .await
            .unwrap_err();

        assert_eq!(error.category(), "ConnectError");
    }

    #[test]
    fn test_too_many_redirects_message() {
        let error = TransportError::TooManyRedirects(10);
        assert_eq!(error.to_string(), "Maximum number of redirections (10) exceeded");
        assert_eq!(error.category(), "RedirectError");
    }
}

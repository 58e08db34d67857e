// src/checker/settings.rs
// =============================================================================
// Network configuration for the HTTP validator.
//
// This is read-only run configuration: it is built once (from the CLI) and
// then shared by the transport and the validator.
// =============================================================================

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Extra parameter overriding the maximum number of redirects.
pub const MAX_REDIRECTS_PARAM: &str = "http.protocol.max-redirects";
/// Extra parameter overriding the per-request user agent.
pub const USER_AGENT_PARAM: &str = "http.useragent";
/// Extra parameter overriding the connect timeout (milliseconds).
pub const CONNECT_TIMEOUT_PARAM: &str = "http.connection.timeout";
/// Extra parameter bounding idle pooled connections per host.
pub const MAX_PER_HOST_PARAM: &str = "http.connection-manager.max-per-host";

pub const DEFAULT_MAX_REDIRECTS: usize = 10;

// Some servers reject unknown clients, so we present ourselves as a browser
pub const DEFAULT_USER_AGENT: &str = "Mozilla/4.0 (compatible; MSIE 6.0; Windows NT 5.0)";

const KNOWN_PARAMS: [&str; 4] = [
    MAX_REDIRECTS_PARAM,
    USER_AGENT_PARAM,
    CONNECT_TIMEOUT_PARAM,
    MAX_PER_HOST_PARAM,
];

/// Request method used to probe links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Head,
    Get,
}

impl ProbeMethod {
    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            ProbeMethod::Head => reqwest::Method::HEAD,
            ProbeMethod::Get => reqwest::Method::GET,
        }
    }
}

/// Proxy routing and credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Set when the proxy expects NTLM credentials
    pub ntlm_host: Option<String>,
    pub ntlm_domain: Option<String>,
}

impl ProxySettings {
    pub fn url(&self) -> String {
        if self.port > 0 {
            format!("http://{}:{}", self.host, self.port)
        } else {
            format!("http://{}", self.host)
        }
    }

    /// User name and password to present to the proxy, if any.
    pub fn credentials(&self) -> Option<(String, String)> {
        let user = self.user.as_deref().filter(|u| !u.is_empty())?;
        let password = self.password.clone()?;

        let ntlm = self.ntlm_host.as_deref().filter(|h| !h.is_empty());
        if ntlm.is_some() {
            warn!("NTLM proxy authentication is not supported; sending domain credentials as basic auth");
            let user = match self.ntlm_domain.as_deref().filter(|d| !d.is_empty()) {
                Some(domain) => format!("{}\\{}", domain, user),
                None => user.to_string(),
            };
            return Some((user, password));
        }

        Some((user.to_string(), password))
    }
}

/// Everything the HTTP validator needs to know about the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// "head" or "get" (case-insensitive)
    pub method: String,
    /// Connect and read timeout in milliseconds, 0 = transport default
    pub timeout_ms: u64,
    /// Whether the transport itself follows redirects
    pub follow_redirects: bool,
    /// Prefix for links starting with '/'
    pub base_url: Option<String>,
    pub proxy: Option<ProxySettings>,
    pub extra_parameters: BTreeMap<String, String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            method: "head".to_string(),
            timeout_ms: 0,
            follow_redirects: false,
            base_url: None,
            proxy: None,
            extra_parameters: BTreeMap::new(),
        }
    }
}

impl HttpSettings {
    /// The configured method; anything other than HEAD or GET falls back to GET.
    pub fn probe_method(&self) -> ProbeMethod {
        if self.method.eq_ignore_ascii_case("head") {
            ProbeMethod::Head
        } else if self.method.eq_ignore_ascii_case("get") {
            ProbeMethod::Get
        } else {
            error!("Unsupported method: {}, using 'get'.", self.method);
            ProbeMethod::Get
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.numeric_param(CONNECT_TIMEOUT_PARAM)
            .filter(|ms| *ms > 0)
            .map(|ms| Duration::from_millis(ms as u64))
            .or_else(|| self.timeout())
    }

    pub fn max_redirects(&self) -> usize {
        self.numeric_param(MAX_REDIRECTS_PARAM)
            .unwrap_or(DEFAULT_MAX_REDIRECTS)
    }

    pub fn max_idle_per_host(&self) -> Option<usize> {
        self.numeric_param(MAX_PER_HOST_PARAM)
    }

    pub fn user_agent(&self) -> &str {
        self.extra_parameters
            .get(USER_AGENT_PARAM)
            .map(String::as_str)
            .filter(|ua| !ua.is_empty())
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    /// The base URL without its trailing slashes, if one is configured.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    /// Logs the extra parameters the transport does not understand.
    pub fn log_unknown_parameters(&self) {
        for key in self.extra_parameters.keys() {
            if !KNOWN_PARAMS.contains(&key.as_str()) {
                debug!("Ignoring unsupported HTTP parameter '{}'", key);
            }
        }
    }

    fn numeric_param(&self, key: &str) -> Option<usize> {
        let raw = self.extra_parameters.get(key)?;
        match raw.trim().parse::<usize>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("HTTP parameter '{}' is not a number. Ignoring!", key);
                None
            }
        }
    }
}

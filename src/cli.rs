// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The command line is the whole configuration surface of a run:
// - what to check (documents to scan, or links given directly)
// - how to reach the network (method, timeout, proxy, base URL, ...)
// - what to skip (excluded hosts and link patterns)
// =============================================================================

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;

use doc_linkcheck::checker::{HttpSettings, ProxySettings};

#[derive(Parser, Debug)]
#[command(
    name = "doc-linkcheck",
    version,
    about = "Validates the links found in Markdown and HTML documents",
    long_about = "doc-linkcheck extracts the links from Markdown and HTML documents and checks \
                  that each one resolves. Web links are probed over HTTP (following redirects \
                  and verifying #anchors), local links are looked up on disk. Every distinct \
                  target is checked once per run."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan documents (files or directories) and validate their links
    ///
    /// Example: doc-linkcheck scan docs/ README.md --base-url https://example.com
    Scan {
        /// Markdown / HTML files, or directories to walk recursively
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        options: CheckOptions,
    },

    /// Validate links given on the command line
    ///
    /// Example: doc-linkcheck check https://www.rust-lang.org mailto:me@example.com
    Check {
        /// Links to validate
        #[arg(required = true)]
        links: Vec<String>,

        #[command(flatten)]
        options: CheckOptions,
    },
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct CheckOptions {
    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,

    /// HTTP method used to probe links: head or get
    #[arg(long, default_value = "head")]
    pub method: String,

    /// Connect and read timeout in milliseconds (0 = client default)
    #[arg(long, default_value_t = 0)]
    pub timeout: u64,

    /// Let the HTTP client follow redirects on its own
    #[arg(long)]
    pub follow_redirects: bool,

    /// Prefix for links starting with '/'
    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub proxy_host: Option<String>,

    #[arg(long, default_value_t = 0)]
    pub proxy_port: u16,

    #[arg(long)]
    pub proxy_user: Option<String>,

    #[arg(long)]
    pub proxy_password: Option<String>,

    #[arg(long)]
    pub proxy_ntlm_host: Option<String>,

    #[arg(long)]
    pub proxy_ntlm_domain: Option<String>,

    /// Extra HTTP parameter, e.g. --param http.protocol.max-redirects=5
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Host whose links are skipped (may contain '*'); repeatable
    #[arg(long = "exclude-host", value_name = "HOST")]
    pub exclude_hosts: Vec<String>,

    /// Link pattern to skip, e.g. "https://example.com/private/**"; repeatable
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,

    /// Maximum number of links validated at the same time
    #[arg(long, default_value_t = 16)]
    pub concurrency: usize,
}

impl CheckOptions {
    /// Network configuration described by these options.
    pub fn http_settings(&self) -> HttpSettings {
        let proxy = self
            .proxy_host
            .as_ref()
            .filter(|host| !host.is_empty())
            .map(|host| ProxySettings {
                host: host.clone(),
                port: self.proxy_port,
                user: self.proxy_user.clone(),
                password: self.proxy_password.clone(),
                ntlm_host: self.proxy_ntlm_host.clone(),
                ntlm_domain: self.proxy_ntlm_domain.clone(),
            });

        HttpSettings {
            method: self.method.clone(),
            timeout_ms: self.timeout,
            follow_redirects: self.follow_redirects,
            base_url: self.base_url.clone(),
            proxy,
            extra_parameters: self.params.iter().cloned().collect::<BTreeMap<_, _>>(),
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("empty parameter name in '{}'", raw));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

// src/checker/mod.rs
// =============================================================================
// This module contains all link validation logic.
//
// Submodules:
// - result: items, severity levels and validation results
// - pattern: glob matching for exclusion rules
// - validator: the trait every validator implements
// - manager: exclusion, dispatch by scheme and the per-run result cache
// - settings: network configuration for the HTTP validator
// - transport: the HTTP seam (reqwest in production, fixtures in tests)
// - http: the HTTP validator (redirect chase, status classification)
// - anchors: in-page anchor lookup
// - mail / file: the mailto: and local file validators
//
// This file (mod.rs) is the module root. It re-exports the public API so
// the rest of the application writes `checker::LinkValidatorManager`
// instead of `checker::manager::LinkValidatorManager`.
// =============================================================================

mod anchors;
mod file;
mod http;
mod mail;
mod manager;
mod pattern;
mod result;
mod settings;
mod transport;
mod validator;

pub use file::FileLinkValidator;
pub use http::HttpLinkValidator;
pub use mail::MailtoLinkValidator;
pub use manager::{scheme_of, LinkValidatorManager, FILE_SCHEME};
pub use pattern::{matches, ExcludePattern};
pub use result::{HttpStatusLine, Level, LinkReport, LinkValidationItem, LinkValidationResult};
pub use settings::{HttpSettings, ProbeMethod, ProxySettings};
pub use transport::{HttpTransport, ProbeRequest, ProbeResponse, ReqwestTransport, TransportError};
pub use validator::LinkValidator;

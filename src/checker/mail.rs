// src/checker/mail.rs
// =============================================================================
// mailto: links. There is nothing to check over the network, so every
// mail link is VALID but not a "real" hyperlink.
// =============================================================================

use async_trait::async_trait;

use super::result::{Level, LinkValidationItem, LinkValidationResult};
use super::validator::LinkValidator;

#[derive(Debug, Default, Clone, Copy)]
pub struct MailtoLinkValidator;

impl MailtoLinkValidator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LinkValidator for MailtoLinkValidator {
    fn resource_key(&self, item: &LinkValidationItem) -> Option<String> {
        // Without an '@' this is not an address; never deduplicate it
        if item.link.contains('@') {
            Some(item.link.clone())
        } else {
            None
        }
    }

    async fn validate_resource(&self, _item: &LinkValidationItem) -> LinkValidationResult {
        LinkValidationResult::new(Level::Valid, false, "")
    }
}

// src/checker/validator.rs
// =============================================================================
// The contract every kind of link validator implements.
//
// A validation is split in two so the manager can cache the expensive half:
// 1. validate_resource: checks the resource the link points at (network
//    round trip, file lookup, ...). Its result is cached under resource_key.
// 2. check_fragment: refines a resource result for one occurrence of the
//    link (e.g. "the page exists, but does it contain #section?").
//
// validate_link runs both, with no caching, for callers that use a
// validator on its own.
// =============================================================================

use async_trait::async_trait;

use super::result::{LinkValidationItem, LinkValidationResult};

#[async_trait]
pub trait LinkValidator: Send + Sync {
    /// Identity of the resource behind `item`. Items with equal keys share
    /// one validation. `None` means the item is never cached.
    fn resource_key(&self, item: &LinkValidationItem) -> Option<String>;

    /// Checks the resource behind `item`. Never fails: every fault is
    /// turned into an ERROR result.
    async fn validate_resource(&self, item: &LinkValidationItem) -> LinkValidationResult;

    /// Per-occurrence refinement of a (possibly cached) resource result.
    async fn check_fragment(
        &self,
        _item: &LinkValidationItem,
        resource: &LinkValidationResult,
    ) -> LinkValidationResult {
        resource.clone()
    }

    async fn validate_link(&self, item: &LinkValidationItem) -> LinkValidationResult {
        let resource = self.validate_resource(item).await;
        self.check_fragment(item, &resource).await
    }
}

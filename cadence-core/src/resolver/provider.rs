//! Extraction provider abstraction.

use async_trait::async_trait;

use super::errors::ExtractionError;
use super::locator::MediaDescriptor;
use crate::item::ItemIdentifier;
use crate::profile::ClientProfile;

/// Turns an item identifier into the streams the upstream currently offers.
///
/// Implementations are constructed once at startup and shared by every
/// request; they must not hold per-request mutable state.
#[async_trait]
pub trait ExtractionProvider: Send + Sync + std::fmt::Debug {
    /// Looks up the item while presenting `profile` to the upstream.
    ///
    /// Candidates in the returned descriptor are ordered most-preferred first.
    ///
    /// # Errors
    /// - `ExtractionError::NotFound` - the item does not exist
    /// - `ExtractionError::Unavailable` - no usable format is offered
    /// - `ExtractionError::Rejected` - the upstream flagged the request as automated
    /// - `ExtractionError::ProviderFailed` - the provider could not run or its output was unusable
    /// - `ExtractionError::Timeout` - the provider did not answer in time
    async fn extract(
        &self,
        item: &ItemIdentifier,
        profile: &ClientProfile,
    ) -> Result<MediaDescriptor, ExtractionError>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}

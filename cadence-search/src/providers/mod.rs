//! Provider implementations for catalog search.

use async_trait::async_trait;
use cadence_core::ItemIdentifier;

use crate::errors::SearchError;
use crate::types::{SearchFilter, TrackSummary};

pub mod demo;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod ytdlp;

pub use demo::DemoSearchProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockSearchProvider;
pub use ytdlp::YtDlpSearchProvider;

/// Trait for catalog search providers.
///
/// Implementations return entries in their own ranking order; the service
/// applies validation and caps.
#[async_trait]
pub trait CatalogSearchProvider: Send + Sync + std::fmt::Debug {
    /// Searches the catalog.
    ///
    /// # Errors
    /// - `SearchError::ProviderFailed` - Provider call failed
    /// - `SearchError::ParseError` - Provider output was not understood
    /// - `SearchError::Timeout` - Provider did not answer in time
    async fn search(
        &self,
        query: &str,
        filter: SearchFilter,
        limit: usize,
    ) -> Result<Vec<TrackSummary>, SearchError>;

    /// Lists tracks related to `seed`, possibly including the seed itself.
    ///
    /// # Errors
    /// - `SearchError::ProviderFailed` - Provider call failed
    /// - `SearchError::ParseError` - Provider output was not understood
    async fn related(
        &self,
        seed: &ItemIdentifier,
        limit: usize,
    ) -> Result<Vec<TrackSummary>, SearchError>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}

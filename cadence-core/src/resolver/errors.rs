//! Error types for locator resolution.

use std::time::Duration;

use thiserror::Error;

use crate::item::ItemIdentifier;

/// Failures reported by an extraction provider.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    /// The item does not exist or is private/removed.
    #[error("Item not found: {diagnostic}")]
    NotFound { diagnostic: String },

    /// The item exists but no requested format is available.
    #[error("Item unavailable: {diagnostic}")]
    Unavailable { diagnostic: String },

    /// The upstream classified the request as automated traffic.
    #[error("Request rejected as automated traffic: {diagnostic}")]
    Rejected { diagnostic: String },

    /// The provider could not be run or returned unusable output.
    #[error("Extraction provider failed: {diagnostic}")]
    ProviderFailed { diagnostic: String },

    #[error("Extraction provider timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

impl ExtractionError {
    /// Whether a fresh attempt has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Rejected { .. } | Self::ProviderFailed { .. } | Self::Timeout { .. }
        )
    }
}

/// Why a resolution failed.
#[derive(Debug, Clone, Error)]
pub enum ResolutionFailure {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("No audio-only stream among {candidates} candidates")]
    NoAudioStream { candidates: usize },
}

/// The extraction provider could not produce a playable locator.
///
/// Callers see a single failure kind; the detailed `failure` is kept for
/// operator logs.
#[derive(Debug, Clone, Error)]
#[error("Could not resolve audio for {item}: {failure}")]
pub struct ResolutionError {
    pub item: ItemIdentifier,
    #[source]
    pub failure: ResolutionFailure,
}

impl ResolutionError {
    pub fn new(item: ItemIdentifier, failure: impl Into<ResolutionFailure>) -> Self {
        Self {
            item,
            failure: failure.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        match &self.failure {
            ResolutionFailure::Extraction(e) => e.is_transient(),
            ResolutionFailure::NoAudioStream { .. } => false,
        }
    }
}

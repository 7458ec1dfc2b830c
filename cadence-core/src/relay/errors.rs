//! Error types for the relay pipeline.

use std::time::Duration;

use thiserror::Error;

use crate::item::ItemIdentifier;
use crate::resolver::ResolutionError;

/// Failures opening the upstream byte stream.
///
/// Only raised before the first byte reaches the client; failures after
/// that point end the relay and are reported through `RelayOutcome`.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Upstream connection failed: {reason}")]
    Connect { reason: String },

    #[error("Upstream did not answer within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Upstream answered with status {status}")]
    Status { status: u16 },

    #[error("Upstream client could not be built: {reason}")]
    Client { reason: String },
}

/// A relay request that failed before streaming began.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Could not open upstream for {item}: {source}")]
    Upstream {
        item: ItemIdentifier,
        #[source]
        source: UpstreamError,
    },
}

impl RelayError {
    /// True when the item itself could not be resolved to a playable stream.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Resolution(_))
    }
}

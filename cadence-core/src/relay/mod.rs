//! Audio relay pipeline.
//!
//! Resolves an item, opens the origin-bound upstream with the same client
//! profile used for resolution, and forwards its bytes to the client in
//! fixed-size segments. The upstream is pulled only as fast as the client
//! consumes, and released as soon as the client goes away.

pub mod errors;
pub mod segmenter;
pub mod session;
pub mod upstream;

use std::sync::Arc;

pub use errors::{RelayError, UpstreamError};
pub use segmenter::{Segmenter, with_idle_timeout};
pub use session::{RelayOutcome, RelaySession, RelayStream};
use tokio::io::AsyncWrite;
use tracing::{debug, warn};
pub use upstream::{HttpUpstream, UpstreamFetcher, UpstreamStream};

use crate::config::RelayConfig;
use crate::item::ItemIdentifier;
use crate::resolver::LocatorResolver;

/// Resolve-then-relay pipeline shared by every request.
#[derive(Debug, Clone)]
pub struct RelayPipe {
    resolver: Arc<LocatorResolver>,
    upstream: Arc<dyn UpstreamFetcher>,
    config: RelayConfig,
}

impl RelayPipe {
    pub fn new(
        resolver: Arc<LocatorResolver>,
        upstream: Arc<dyn UpstreamFetcher>,
        config: RelayConfig,
    ) -> Self {
        Self {
            resolver,
            upstream,
            config,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<LocatorResolver> {
        &self.resolver
    }

    /// Resolves `item` and opens its upstream without reading any body bytes.
    ///
    /// Every failure surfaces here, before anything is sent to the client,
    /// so the caller can still answer with a status code.
    ///
    /// # Errors
    /// - `RelayError::Resolution` - no playable audio stream could be resolved
    /// - `RelayError::Upstream` - the upstream could not be opened
    pub async fn open(&self, item: &ItemIdentifier) -> Result<RelaySession, RelayError> {
        let locator = self.resolver.resolve_with_retry(item).await?;

        let upstream = self
            .upstream
            .open(&locator, self.resolver.profile())
            .await
            .map_err(|source| {
                warn!(
                    "Upstream open failed for {} (format {}): {}",
                    item, locator.format_id, source
                );
                RelayError::Upstream {
                    item: item.clone(),
                    source,
                }
            })?;

        debug!(
            "Upstream opened for {} in {:?} since resolution",
            item,
            locator.resolved_at.elapsed()
        );

        Ok(RelaySession::new(
            &locator,
            upstream,
            self.config.segment_size,
            self.config.idle_timeout,
        ))
    }

    /// Opens and relays `item` into an async writer.
    ///
    /// # Errors
    /// - `RelayError` - the relay could not be opened; nothing was written
    pub async fn relay<W>(&self, item: &ItemIdentifier, sink: &mut W) -> Result<RelayOutcome, RelayError>
    where
        W: AsyncWrite + Unpin,
    {
        let session = self.open(item).await?;
        Ok(session.pipe_to(sink).await)
    }
}

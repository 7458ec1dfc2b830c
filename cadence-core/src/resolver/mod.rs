//! Locator resolution.
//!
//! Turns an item identifier into a short-lived, origin-bound `MediaLocator`
//! by asking the extraction provider for candidate streams and selecting
//! the best audio-only one. Locators are never cached: they expire quickly
//! and are bound to the network origin that requested them.

pub mod demo;
pub mod errors;
pub mod locator;
pub mod provider;
pub mod retry;
pub mod selection;
pub mod ytdlp;

use std::sync::Arc;
use std::time::Duration;

pub use demo::DemoExtractionProvider;
pub use errors::{ExtractionError, ResolutionError, ResolutionFailure};
pub use locator::{CandidateStream, CodecFamily, MediaDescriptor, MediaLocator};
pub use provider::ExtractionProvider;
pub use retry::RetryPolicy;
pub use selection::select_audio_stream;
use tracing::{debug, info, warn};
pub use ytdlp::YtDlpProvider;

use crate::config::ResolverConfig;
use crate::item::ItemIdentifier;
use crate::profile::ClientProfile;

/// Resolves items to media locators using one shared provider and profile.
///
/// Constructed once at startup; holds no mutable state and is shared
/// across concurrent requests behind an `Arc`.
#[derive(Debug)]
pub struct LocatorResolver {
    provider: Arc<dyn ExtractionProvider>,
    profile: Arc<ClientProfile>,
    preferred_codec: CodecFamily,
    retry: RetryPolicy,
    timeout: Duration,
}

impl LocatorResolver {
    pub fn new(
        provider: Arc<dyn ExtractionProvider>,
        profile: Arc<ClientProfile>,
        config: &ResolverConfig,
    ) -> Self {
        Self {
            provider,
            profile,
            preferred_codec: config.preferred_codec,
            retry: config.retry,
            timeout: config.timeout,
        }
    }

    /// The profile presented for resolution; the relay must present it too.
    pub fn profile(&self) -> &Arc<ClientProfile> {
        &self.profile
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Resolves an item with a single provider call.
    ///
    /// # Errors
    /// - `ResolutionError` - the provider failed, timed out, or offered no audio-only stream
    pub async fn resolve(&self, item: &ItemIdentifier) -> Result<MediaLocator, ResolutionError> {
        let extraction = tokio::time::timeout(
            self.timeout,
            self.provider.extract(item, &self.profile),
        )
        .await;

        let descriptor = match extraction {
            Ok(Ok(descriptor)) => descriptor,
            Ok(Err(e)) => return Err(ResolutionError::new(item.clone(), e)),
            Err(_) => {
                return Err(ResolutionError::new(
                    item.clone(),
                    ExtractionError::Timeout {
                        timeout: self.timeout,
                    },
                ));
            }
        };

        let no_audio = || {
            ResolutionError::new(
                item.clone(),
                ResolutionFailure::NoAudioStream {
                    candidates: descriptor.candidates.len(),
                },
            )
        };

        let candidate =
            select_audio_stream(&descriptor.candidates, self.preferred_codec).ok_or_else(no_audio)?;
        let locator = MediaLocator::from_candidate(item.clone(), &descriptor, candidate)
            .ok_or_else(no_audio)?;

        debug!(
            "Resolved {} to format {} ({}, {:?}) via {}",
            item,
            locator.format_id,
            locator.audio_codec,
            locator.ext,
            self.provider.name()
        );

        Ok(locator)
    }

    /// Resolves an item, retrying transient failures per the retry policy.
    ///
    /// Permanent failures (not found, no audio stream) are returned at once.
    ///
    /// # Errors
    /// - `ResolutionError` - the last attempt failed, or a permanent failure occurred
    pub async fn resolve_with_retry(
        &self,
        item: &ItemIdentifier,
    ) -> Result<MediaLocator, ResolutionError> {
        let mut retry = 0;
        loop {
            match self.resolve(item).await {
                Ok(locator) => {
                    if retry > 0 {
                        info!("Resolved {} after {} retries", item, retry);
                    }
                    return Ok(locator);
                }
                Err(e) if e.is_transient() && retry < self.retry.max_retries => {
                    let delay = self.retry.backoff(retry);
                    warn!(
                        "Resolution attempt {} for {} failed, retrying in {:?}: {}",
                        retry + 1,
                        item,
                        delay,
                        e.failure
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => {
                    warn!(
                        "Resolution failed for {} with profile {}: {}",
                        item,
                        self.profile.label(),
                        e.failure
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedExtractionProvider;

    fn resolver(provider: ScriptedExtractionProvider, retries: u32) -> LocatorResolver {
        let config = ResolverConfig {
            retry: RetryPolicy {
                max_retries: retries,
                base_backoff: Duration::ZERO,
            },
            timeout: Duration::from_millis(200),
            ..Default::default()
        };
        LocatorResolver::new(
            Arc::new(provider),
            Arc::new(ClientProfile::builtin("desktop-browser").unwrap()),
            &config,
        )
    }

    fn item(id: &str) -> ItemIdentifier {
        ItemIdentifier::parse(id).unwrap()
    }

    #[tokio::test]
    async fn test_resolves_preferred_audio_stream() {
        let provider = ScriptedExtractionProvider::new().with_audio(
            "song1",
            "http://upstream.test/song1",
        );
        let resolver = resolver(provider, 0);

        let locator = resolver.resolve(&item("song1")).await.unwrap();
        assert_eq!(locator.url(), "http://upstream.test/song1");
        assert_eq!(locator.codec, CodecFamily::Aac);
        assert_eq!(locator.item().as_str(), "song1");
    }

    #[tokio::test]
    async fn test_video_only_item_has_no_audio_stream() {
        let provider = ScriptedExtractionProvider::new().with_video_only("clip");
        let resolver = resolver(provider.clone(), 2);

        let err = resolver.resolve_with_retry(&item("clip")).await.unwrap_err();
        assert!(matches!(
            err.failure,
            ResolutionFailure::NoAudioStream { candidates: 1 }
        ));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let provider = ScriptedExtractionProvider::new();
        let resolver = resolver(provider.clone(), 2);

        let err = resolver.resolve_with_retry(&item("missing")).await.unwrap_err();
        assert!(matches!(
            err.failure,
            ResolutionFailure::Extraction(ExtractionError::NotFound { .. })
        ));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_retried_until_success() {
        let provider = ScriptedExtractionProvider::new()
            .with_audio("flaky", "http://upstream.test/flaky")
            .rejecting_first(2);
        let resolver = resolver(provider.clone(), 2);

        let locator = resolver.resolve_with_retry(&item("flaky")).await.unwrap();
        assert_eq!(locator.url(), "http://upstream.test/flaky");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let provider = ScriptedExtractionProvider::new()
            .with_audio("flaky", "http://upstream.test/flaky")
            .rejecting_first(10);
        let resolver = resolver(provider.clone(), 2);

        let err = resolver.resolve_with_retry(&item("flaky")).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let provider = ScriptedExtractionProvider::new()
            .with_audio("slow", "http://upstream.test/slow")
            .with_delay(Duration::from_secs(5));
        let resolver = resolver(provider, 0);

        let err = resolver.resolve(&item("slow")).await.unwrap_err();
        assert!(matches!(
            err.failure,
            ResolutionFailure::Extraction(ExtractionError::Timeout { .. })
        ));
    }
}

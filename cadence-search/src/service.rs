//! Catalog search service
//!
//! Validates queries, bounds provider calls and applies result caps on top
//! of a pluggable search provider.

use std::sync::Arc;

use cadence_core::config::{CadenceConfig, SearchConfig};
use cadence_core::ytdlp::YtDlp;
use cadence_core::{ItemIdentifier, RuntimeMode};
use tracing::{debug, error, warn};

use crate::errors::SearchError;
use crate::providers::{CatalogSearchProvider, DemoSearchProvider, YtDlpSearchProvider};
use crate::types::{SearchFilter, TrackSummary};

/// Catalog search service shared by every request.
#[derive(Debug, Clone)]
pub struct CatalogSearchService {
    provider: Arc<dyn CatalogSearchProvider>,
    config: SearchConfig,
}

impl CatalogSearchService {
    pub fn new(provider: Arc<dyn CatalogSearchProvider>, config: SearchConfig) -> Self {
        Self { provider, config }
    }

    /// Creates the service for the given runtime mode.
    ///
    /// Production mode searches through yt-dlp; development mode serves
    /// demo entries without network access.
    pub fn from_runtime_mode(mode: RuntimeMode, config: &CadenceConfig) -> Self {
        let provider: Arc<dyn CatalogSearchProvider> = match mode {
            RuntimeMode::Production => Arc::new(YtDlpSearchProvider::new(YtDlp::new(
                config.resolver.provider_binary.clone(),
                config.search.timeout,
            ))),
            RuntimeMode::Development => Arc::new(DemoSearchProvider::new()),
        };
        Self::new(provider, config.search.clone())
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Searches for songs, in provider order, capped at the configured limit.
    ///
    /// # Errors
    /// See [`CatalogSearchService::search_filtered`].
    pub async fn search(&self, query: &str) -> Result<Vec<TrackSummary>, SearchError> {
        self.search_filtered(query, SearchFilter::Songs).await
    }

    /// Searches the catalog with an explicit filter.
    ///
    /// Results keep provider order and are capped at the configured limit.
    /// Entries without an id or title are dropped.
    ///
    /// # Errors
    /// - `SearchError::EmptyQuery` - query is blank; the provider is not called
    /// - `SearchError::ProviderFailed` - provider call failed
    /// - `SearchError::Timeout` - provider did not answer in time
    pub async fn search_filtered(
        &self,
        query: &str,
        filter: SearchFilter,
    ) -> Result<Vec<TrackSummary>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let cap = self.config.result_cap;
        let call = self.provider.search(query, filter, cap);
        let results = match tokio::time::timeout(self.config.timeout, call).await {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                error!("Search for {:?} failed via {}: {}", query, self.provider.name(), e);
                return Err(e);
            }
            Err(_) => {
                error!("Search for {:?} timed out via {}", query, self.provider.name());
                return Err(SearchError::Timeout {
                    timeout: self.config.timeout,
                });
            }
        };

        let tracks: Vec<TrackSummary> = results
            .into_iter()
            .filter(TrackSummary::is_playable)
            .take(cap)
            .collect();

        debug!("Search for {:?} returned {} entries", query, tracks.len());
        Ok(tracks)
    }

    /// Lists tracks related to `seed`, seed excluded.
    ///
    /// Provider failures and timeouts yield an empty list.
    pub async fn similar(&self, seed: &ItemIdentifier) -> Vec<TrackSummary> {
        let cap = self.config.similar_cap;
        let call = self.provider.related(seed, cap);
        let results = match tokio::time::timeout(self.config.timeout, call).await {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                warn!("Related tracks for {} unavailable: {}", seed, e);
                return Vec::new();
            }
            Err(_) => {
                warn!("Related tracks for {} timed out", seed);
                return Vec::new();
            }
        };

        results
            .into_iter()
            .filter(|track| track.is_playable() && track.id != seed.as_str())
            .take(cap)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::providers::MockSearchProvider;

    fn service(provider: MockSearchProvider) -> CatalogSearchService {
        CatalogSearchService::new(Arc::new(provider), SearchConfig::default())
    }

    #[tokio::test]
    async fn test_blank_query_never_reaches_provider() {
        let provider = MockSearchProvider::with_tracks(3);
        let service = service(provider.clone());

        for query in ["", "   ", "\t\n"] {
            let err = service.search(query).await.unwrap_err();
            assert!(matches!(err, SearchError::EmptyQuery));
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_results_capped_in_provider_order() {
        let service = service(MockSearchProvider::with_tracks(45));

        let tracks = service.search("test").await.unwrap();
        assert_eq!(tracks.len(), 30);
        assert_eq!(tracks[0].id, "track0");
        assert_eq!(tracks[29].id, "track29");
    }

    #[tokio::test]
    async fn test_unplayable_entries_dropped() {
        let entry = |id: &str, title: &str| TrackSummary {
            id: id.to_string(),
            title: title.to_string(),
            uploader: "Band".to_string(),
            thumbnail_url: None,
            duration: None,
        };
        let service = service(MockSearchProvider::new(vec![
            entry("", "No id"),
            entry("a1", "Kept"),
            entry("b2", ""),
            entry("c3", "Also kept"),
        ]));

        let tracks = service.search("test").await.unwrap();
        let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "c3"]);
    }

    #[tokio::test]
    async fn test_filter_reaches_provider() {
        let provider = MockSearchProvider::with_tracks(2);
        let service = service(provider.clone());

        service.search("test").await.unwrap();
        service
            .search_filtered("test", SearchFilter::All)
            .await
            .unwrap();

        assert_eq!(provider.filters(), vec![SearchFilter::Songs, SearchFilter::All]);
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces() {
        let service = service(MockSearchProvider::failing());
        let err = service.search("test").await.unwrap_err();
        assert!(matches!(err, SearchError::ProviderFailed { .. }));
        assert!(!err.is_user_error());
    }

    #[tokio::test]
    async fn test_similar_excludes_seed_and_caps() {
        let service = service(MockSearchProvider::with_tracks(25));
        let seed = ItemIdentifier::parse("track0").unwrap();

        let tracks = service.similar(&seed).await;
        assert_eq!(tracks.len(), 20);
        assert!(tracks.iter().all(|t| t.id != "track0"));
        assert_eq!(tracks[0].id, "track1");
    }

    #[tokio::test]
    async fn test_similar_failure_is_empty() {
        let service = service(MockSearchProvider::failing());
        let seed = ItemIdentifier::parse("abc").unwrap();
        assert!(service.similar(&seed).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        #[derive(Debug)]
        struct Stalled;

        #[async_trait::async_trait]
        impl CatalogSearchProvider for Stalled {
            async fn search(
                &self,
                _query: &str,
                _filter: SearchFilter,
                _limit: usize,
            ) -> Result<Vec<TrackSummary>, SearchError> {
                std::future::pending().await
            }

            async fn related(
                &self,
                _seed: &ItemIdentifier,
                _limit: usize,
            ) -> Result<Vec<TrackSummary>, SearchError> {
                std::future::pending().await
            }

            fn name(&self) -> &'static str {
                "stalled"
            }
        }

        let config = SearchConfig {
            timeout: Duration::from_secs(1),
            ..Default::default()
        };
        let service = CatalogSearchService::new(Arc::new(Stalled), config);
        let err = service.search("test").await.unwrap_err();
        assert!(matches!(err, SearchError::Timeout { .. }));
    }
}

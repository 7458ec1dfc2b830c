//! Mock provider implementation for testing.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cadence_core::ItemIdentifier;

use super::CatalogSearchProvider;
use crate::errors::SearchError;
use crate::types::{SearchFilter, TrackSummary};

/// Mock provider returning a fixed entry list and counting calls.
#[derive(Debug, Clone, Default)]
pub struct MockSearchProvider {
    entries: Vec<TrackSummary>,
    failing: bool,
    calls: Arc<AtomicUsize>,
    filters: Arc<Mutex<Vec<SearchFilter>>>,
}

impl MockSearchProvider {
    /// Creates a mock returning `entries` for every search and related call.
    pub fn new(entries: Vec<TrackSummary>) -> Self {
        Self {
            entries,
            ..Default::default()
        }
    }

    /// Creates a mock with `count` generated entries `track0`, `track1`, ...
    pub fn with_tracks(count: usize) -> Self {
        Self::new(
            (0..count)
                .map(|i| TrackSummary {
                    id: format!("track{i}"),
                    title: format!("Track {i}"),
                    uploader: "Mock Artist".to_string(),
                    thumbnail_url: Some(format!("https://img.example/track{i}.jpg")),
                    duration: Some(180),
                })
                .collect(),
        )
    }

    /// Creates a mock whose every call fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    /// Number of provider calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Filters passed to `search`, in call order.
    pub fn filters(&self) -> Vec<SearchFilter> {
        self.filters
            .lock()
            .map(|filters| filters.clone())
            .unwrap_or_default()
    }

    fn answer(&self) -> Result<Vec<TrackSummary>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(SearchError::ProviderFailed {
                reason: "mock provider failure".to_string(),
            });
        }
        Ok(self.entries.clone())
    }
}

#[async_trait]
impl CatalogSearchProvider for MockSearchProvider {
    async fn search(
        &self,
        _query: &str,
        filter: SearchFilter,
        _limit: usize,
    ) -> Result<Vec<TrackSummary>, SearchError> {
        if let Ok(mut filters) = self.filters.lock() {
            filters.push(filter);
        }
        self.answer()
    }

    async fn related(
        &self,
        _seed: &ItemIdentifier,
        _limit: usize,
    ) -> Result<Vec<TrackSummary>, SearchError> {
        self.answer()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

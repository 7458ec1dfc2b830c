//! Demo provider implementation for development.

use async_trait::async_trait;
use cadence_core::ItemIdentifier;

use super::CatalogSearchProvider;
use crate::errors::SearchError;
use crate::types::{SearchFilter, TrackSummary};

const DEMO_ARTISTS: &[&str] = &["The Demo Tapes", "Offline Orchestra", "Localhost Trio"];

/// Demo provider for front-end development without network access.
///
/// Generates deterministic entries derived from the query. Pair it with
/// `CADENCE_DEV_MEDIA_URL` so every demo entry is playable.
#[derive(Debug, Default)]
pub struct DemoSearchProvider;

impl DemoSearchProvider {
    pub fn new() -> Self {
        Self
    }

    fn tracks(prefix: &str, label: &str, count: usize) -> Vec<TrackSummary> {
        (0..count)
            .map(|i| TrackSummary {
                id: format!("{prefix}{i:02}"),
                title: format!("{label} #{}", i + 1),
                uploader: DEMO_ARTISTS[i % DEMO_ARTISTS.len()].to_string(),
                thumbnail_url: None,
                duration: Some(150 + (i as u64 * 17) % 120),
            })
            .collect()
    }
}

#[async_trait]
impl CatalogSearchProvider for DemoSearchProvider {
    async fn search(
        &self,
        query: &str,
        _filter: SearchFilter,
        limit: usize,
    ) -> Result<Vec<TrackSummary>, SearchError> {
        Ok(Self::tracks("demo", query, limit.min(12)))
    }

    async fn related(
        &self,
        seed: &ItemIdentifier,
        limit: usize,
    ) -> Result<Vec<TrackSummary>, SearchError> {
        Ok(Self::tracks(
            "radio",
            &format!("Radio for {seed}"),
            limit.min(8),
        ))
    }

    fn name(&self) -> &'static str {
        "demo"
    }
}

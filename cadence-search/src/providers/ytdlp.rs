//! Catalog search through yt-dlp's flat playlist extraction.

use async_trait::async_trait;
use cadence_core::ItemIdentifier;
use cadence_core::ytdlp::{YtDlp, YtDlpError};
use serde::Deserialize;

use super::CatalogSearchProvider;
use crate::errors::SearchError;
use crate::types::{SearchFilter, TrackSummary};

const MUSIC_BASE_URL: &str = "https://music.youtube.com";

/// Searches the music catalog by running yt-dlp in flat-playlist mode.
#[derive(Debug, Clone)]
pub struct YtDlpSearchProvider {
    ytdlp: YtDlp,
}

impl YtDlpSearchProvider {
    pub fn new(ytdlp: YtDlp) -> Self {
        Self { ytdlp }
    }

    async fn list(&self, target: &str, limit: usize) -> Result<Vec<TrackSummary>, SearchError> {
        let args = vec![
            "--flat-playlist".to_string(),
            "--playlist-end".to_string(),
            limit.to_string(),
        ];
        let playlist: FlatPlaylist = self
            .ytdlp
            .run_json(&args, target)
            .await
            .map_err(search_error)?;

        Ok(playlist.entries.into_iter().map(TrackSummary::from).collect())
    }
}

#[async_trait]
impl CatalogSearchProvider for YtDlpSearchProvider {
    async fn search(
        &self,
        query: &str,
        filter: SearchFilter,
        limit: usize,
    ) -> Result<Vec<TrackSummary>, SearchError> {
        self.list(&search_target(query, filter, limit), limit).await
    }

    async fn related(
        &self,
        seed: &ItemIdentifier,
        limit: usize,
    ) -> Result<Vec<TrackSummary>, SearchError> {
        // The radio playlist starts with the seed itself.
        self.list(&radio_target(seed), limit + 1).await
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

fn search_target(query: &str, filter: SearchFilter, limit: usize) -> String {
    match filter {
        SearchFilter::Songs => format!(
            "{MUSIC_BASE_URL}/search?q={}#songs",
            urlencoding::encode(query)
        ),
        SearchFilter::All => format!("ytsearch{limit}:{query}"),
    }
}

fn radio_target(seed: &ItemIdentifier) -> String {
    format!("{MUSIC_BASE_URL}/watch?v={seed}&list=RDAMVM{seed}")
}

fn search_error(error: YtDlpError) -> SearchError {
    match error {
        YtDlpError::Timeout { timeout } => SearchError::Timeout { timeout },
        YtDlpError::InvalidOutput { reason } => SearchError::ParseError { reason },
        other => SearchError::ProviderFailed {
            reason: other.to_string(),
        },
    }
}

#[derive(Debug, Deserialize)]
struct FlatPlaylist {
    #[serde(default)]
    entries: Vec<FlatEntry>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    #[serde(default)]
    id: String,
    title: Option<String>,
    channel: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    #[serde(default)]
    thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl From<FlatEntry> for TrackSummary {
    fn from(entry: FlatEntry) -> Self {
        // yt-dlp lists thumbnails smallest first.
        let thumbnail_url = entry
            .thumbnails
            .into_iter()
            .next_back()
            .map(|thumb| thumb.url)
            .or(entry.thumbnail);

        Self {
            id: entry.id,
            title: entry.title.unwrap_or_default(),
            uploader: entry.channel.or(entry.uploader).unwrap_or_default(),
            thumbnail_url,
            duration: entry
                .duration
                .filter(|secs| *secs >= 0.0)
                .map(|secs| secs.round() as u64),
        }
    }
}

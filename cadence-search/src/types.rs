//! Catalog search result types.

use serde::{Deserialize, Serialize};

/// One catalog entry as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    /// Item identifier, usable with `/stream/{id}`
    pub id: String,
    pub title: String,
    pub uploader: String,
    pub thumbnail_url: Option<String>,
    /// Duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl TrackSummary {
    /// Entries without an id or title cannot be shown or played.
    pub fn is_playable(&self) -> bool {
        !self.id.trim().is_empty() && !self.title.trim().is_empty()
    }
}

/// Restricts what kind of catalog entries a search returns.
///
/// Accepted from clients as `songs` or `all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchFilter {
    /// Music tracks only
    #[default]
    Songs,
    /// Any catalog entry
    All,
}

//! Catalog search and related-track handlers

use axum::Json;
use axum::extract::{Query, State};
use cadence_core::ItemIdentifier;
use cadence_search::{SearchError, SearchFilter, TrackSummary};
use serde::Deserialize;

use crate::errors::ApiError;
use crate::server::AppState;

/// `/search` parameters; `query` is accepted as an alias of `q`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub query: Option<String>,
    /// `songs` (default) or `all`
    #[serde(default)]
    pub filter: SearchFilter,
}

/// `/similar` parameters; `id` is accepted as an alias of `video_id`.
#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub video_id: Option<String>,
    pub id: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<TrackSummary>>, ApiError> {
    let query = params
        .q
        .or(params.query)
        .ok_or(ApiError::Search(SearchError::EmptyQuery))?;

    let tracks = state.search.search_filtered(&query, params.filter).await?;
    Ok(Json(tracks))
}

pub async fn similar(
    State(state): State<AppState>,
    Query(params): Query<SimilarQuery>,
) -> Result<Json<Vec<TrackSummary>>, ApiError> {
    let raw = params.video_id.or(params.id).unwrap_or_default();
    let seed = ItemIdentifier::parse(&raw)?;

    Ok(Json(state.search.similar(&seed).await))
}

//! Health check handler

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub mode: String,
    pub profile: String,
    pub profile_version: u32,
    pub uptime_secs: u64,
    pub timestamp: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        mode: state.mode.to_string(),
        profile: state.profile.name().to_string(),
        profile_version: state.profile.version(),
        uptime_secs: state.server_started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

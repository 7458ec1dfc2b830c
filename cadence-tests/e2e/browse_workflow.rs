//! Search, related tracks and the front-end over real HTTP.

use std::path::{Path, PathBuf};

use cadence_core::testing::ScriptedExtractionProvider;
use cadence_search::providers::MockSearchProvider;
use serde_json::Value;

use crate::support::start_cadence;

fn front_end_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../static")
}

async fn cadence_with(search: MockSearchProvider) -> String {
    start_cadence(ScriptedExtractionProvider::new(), search, &front_end_dir()).await
}

#[tokio::test]
async fn test_search_returns_catalog_entries() {
    let base = cadence_with(MockSearchProvider::with_tracks(3)).await;

    let response = reqwest::get(format!("{base}/search?q=night%20drive"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let tracks: Vec<Value> = response.json().await.unwrap();
    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks[0]["id"], "track0");
    assert!(tracks[0]["title"].is_string());
    assert!(tracks[0]["uploader"].is_string());
}

#[tokio::test]
async fn test_blank_search_is_rejected_without_provider_call() {
    let search = MockSearchProvider::with_tracks(3);
    let base = cadence_with(search.clone()).await;

    for query in ["", "q=", "q=%20%20"] {
        let response = reqwest::get(format!("{base}/search?{query}")).await.unwrap();
        assert_eq!(response.status(), 400, "{query:?}");
        let json: Value = response.json().await.unwrap();
        assert!(json["error"].is_string());
    }
    assert_eq!(search.calls(), 0);
}

#[tokio::test]
async fn test_failing_search_is_server_error() {
    let base = cadence_with(MockSearchProvider::failing()).await;

    let response = reqwest::get(format!("{base}/search?q=anything")).await.unwrap();

    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn test_similar_excludes_the_seed() {
    let base = cadence_with(MockSearchProvider::with_tracks(5)).await;

    let response = reqwest::get(format!("{base}/similar?video_id=track2"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let tracks: Vec<Value> = response.json().await.unwrap();
    assert_eq!(tracks.len(), 4);
    assert!(tracks.iter().all(|t| t["id"] != "track2"));
}

#[tokio::test]
async fn test_stream_info_points_at_relay() {
    let base = cadence_with(MockSearchProvider::with_tracks(0)).await;

    let json: Value = reqwest::get(format!("{base}/stream-info/track7"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["relayUrl"], "/stream/track7");
}

#[tokio::test]
async fn test_front_end_is_served_at_root() {
    let base = cadence_with(MockSearchProvider::with_tracks(0)).await;

    let index = reqwest::get(format!("{base}/")).await.unwrap();
    assert_eq!(index.status(), 200);
    assert!(index.text().await.unwrap().contains("<title>Cadence</title>"));

    let script = reqwest::get(format!("{base}/script.js")).await.unwrap();
    assert_eq!(script.status(), 200);
    assert!(script.text().await.unwrap().contains("/stream/"));
}

#[tokio::test]
async fn test_health_reports_ok() {
    let base = cadence_with(MockSearchProvider::with_tracks(0)).await;

    let json: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["status"], "ok");
    assert_eq!(json["profile"], "desktop-browser");
}

//! Audio relay over real HTTP.

use std::path::Path;
use std::time::{Duration, Instant};

use cadence_core::testing::ScriptedExtractionProvider;
use cadence_search::providers::MockSearchProvider;

use crate::support::{FakeMediaHost, MEDIA_LEN, audio, profile_user_agent, start_cadence};

async fn cadence_for(host: &FakeMediaHost) -> String {
    let provider = ScriptedExtractionProvider::new()
        .with_audio("song", &host.url("/media"))
        .with_audio("endless", &host.url("/endless"))
        .with_audio("stalled", &host.url("/stall"))
        .with_audio("broken", &host.url("/broken"))
        .with_video_only("clip");
    start_cadence(provider, MockSearchProvider::with_tracks(0), Path::new("does-not-exist")).await
}

#[tokio::test]
async fn test_stream_relays_exact_bytes_with_headers() {
    let host = FakeMediaHost::start(&profile_user_agent()).await;
    let base = cadence_for(&host).await;

    let response = reqwest::get(format!("{base}/stream/song")).await.unwrap();

    assert_eq!(response.status(), 200);
    let headers = response.headers();
    assert_eq!(headers["content-type"], "audio/mp4");
    assert_eq!(headers["content-length"], MEDIA_LEN.to_string().as_str());
    assert_eq!(headers["cache-control"], "no-store, no-cache, must-revalidate");
    assert_eq!(headers["pragma"], "no-cache");
    assert_eq!(headers["expires"], "0");

    let body = response.bytes().await.unwrap();
    assert_eq!(body.len(), MEDIA_LEN);
    assert_eq!(body.as_ref(), audio(MEDIA_LEN).as_slice());
}

#[tokio::test]
async fn test_unresolvable_items_are_not_found() {
    let host = FakeMediaHost::start(&profile_user_agent()).await;
    let base = cadence_for(&host).await;

    for id in ["clip", "nothing-here"] {
        let response = reqwest::get(format!("{base}/stream/{id}")).await.unwrap();
        assert_eq!(response.status(), 404, "{id}");
        assert!(response.bytes().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let host = FakeMediaHost::start(&profile_user_agent()).await;
    let base = cadence_for(&host).await;

    let response = reqwest::get(format!("{base}/stream/bad.id")).await.unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_rejected_upstream_is_server_error() {
    let host = FakeMediaHost::start("SomeOtherAgent/1.0").await;
    let base = cadence_for(&host).await;

    let response = reqwest::get(format!("{base}/stream/song")).await.unwrap();

    assert_eq!(response.status(), 500);
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mid_stream_failure_aborts_client_body() {
    let host = FakeMediaHost::start(&profile_user_agent()).await;
    let base = cadence_for(&host).await;

    let response = reqwest::get(format!("{base}/stream/broken")).await.unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.bytes().await.is_err());
}

#[tokio::test]
async fn test_client_disconnect_stops_upstream_reads() {
    let host = FakeMediaHost::start(&profile_user_agent()).await;
    let base = cadence_for(&host).await;

    let mut response = reqwest::get(format!("{base}/stream/endless")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers().get("content-length").is_none());

    let mut received = 0;
    while received < 512 * 1024 {
        let chunk = response.chunk().await.unwrap().unwrap();
        received += chunk.len();
    }
    drop(response);

    // Let buffered data drain, then confirm the host is no longer read.
    tokio::time::sleep(Duration::from_millis(1000)).await;
    let settled = host.endless_reads();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(host.endless_reads(), settled);
}

#[tokio::test]
async fn test_stalled_relay_does_not_delay_other_relays() {
    let host = FakeMediaHost::start(&profile_user_agent()).await;
    let base = cadence_for(&host).await;

    let stalled = reqwest::get(format!("{base}/stream/stalled")).await.unwrap();
    assert_eq!(stalled.status(), 200);
    let stalled_started = Instant::now();
    let stalled_body = tokio::spawn(async move { stalled.bytes().await });

    let started = Instant::now();
    let body = reqwest::get(format!("{base}/stream/song"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(body.len(), MEDIA_LEN);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!stalled_body.is_finished());

    // The stalled relay ends once the idle timeout trips.
    let result = stalled_body.await.unwrap();
    assert!(result.is_err());
    assert!(stalled_started.elapsed() >= Duration::from_secs(1));
}

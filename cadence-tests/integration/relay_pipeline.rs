//! Relay pipe against a loopback media host.

use std::time::{Duration, Instant};

use cadence_core::relay::UpstreamError;
use cadence_core::testing::ScriptedExtractionProvider;
use cadence_core::{ItemIdentifier, RelayError, RelayOutcome};

use crate::support::{
    BROKEN_AFTER, FakeMediaHost, MEDIA_LEN, audio, profile_user_agent, relay_pipe,
};

fn item(id: &str) -> ItemIdentifier {
    ItemIdentifier::parse(id).unwrap()
}

#[tokio::test]
async fn test_relay_copies_upstream_body_exactly() {
    let host = FakeMediaHost::start(&profile_user_agent()).await;
    let pipe = relay_pipe(ScriptedExtractionProvider::new().with_audio("song", &host.url("/media")));

    let session = pipe.open(&item("song")).await.unwrap();
    assert_eq!(session.content_length(), Some(MEDIA_LEN as u64));
    assert_eq!(session.content_type("audio/mp4"), "audio/mp4");

    let mut sink = Vec::new();
    let outcome = session.pipe_to(&mut sink).await;

    assert!(outcome.is_completed(), "{outcome:?}");
    assert_eq!(outcome.bytes(), MEDIA_LEN as u64);
    assert_eq!(sink, audio(MEDIA_LEN));
}

#[tokio::test]
async fn test_host_rejects_requests_without_profile_user_agent() {
    let host = FakeMediaHost::start("SomeOtherAgent/1.0").await;
    let provider = ScriptedExtractionProvider::new().with_audio("song", &host.url("/media"));
    let pipe = relay_pipe(provider.clone());

    let result = pipe.open(&item("song")).await;

    match result {
        Err(RelayError::Upstream {
            source: UpstreamError::Status { status },
            ..
        }) => assert_eq!(status, 403),
        other => panic!("expected a 403 upstream status, got {other:?}"),
    }
    // Upstream rejection happens after resolution and is not retried there.
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_unreachable_host_is_upstream_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{addr}/media");
    let pipe = relay_pipe(ScriptedExtractionProvider::new().with_audio("song", &url));

    let result = pipe.open(&item("song")).await;

    assert!(matches!(
        result,
        Err(RelayError::Upstream {
            source: UpstreamError::Connect { .. } | UpstreamError::Timeout { .. },
            ..
        })
    ));
}

#[tokio::test]
async fn test_mid_stream_failure_is_reported() {
    let host = FakeMediaHost::start(&profile_user_agent()).await;
    let pipe = relay_pipe(ScriptedExtractionProvider::new().with_audio("song", &host.url("/broken")));

    let session = pipe.open(&item("song")).await.unwrap();
    let mut sink = Vec::new();
    let outcome = session.pipe_to(&mut sink).await;

    assert!(
        matches!(outcome, RelayOutcome::UpstreamFailed { .. }),
        "{outcome:?}"
    );
    assert_eq!(outcome.bytes(), BROKEN_AFTER as u64);
    assert_eq!(sink, audio(BROKEN_AFTER));
}

#[tokio::test]
async fn test_silent_upstream_hits_idle_timeout() {
    let host = FakeMediaHost::start(&profile_user_agent()).await;
    let pipe = relay_pipe(ScriptedExtractionProvider::new().with_audio("song", &host.url("/stall")));
    let idle = pipe.config().idle_timeout;

    let started = Instant::now();
    let session = pipe.open(&item("song")).await.unwrap();
    let mut sink = Vec::new();
    let outcome = session.pipe_to(&mut sink).await;

    assert!(
        matches!(outcome, RelayOutcome::UpstreamFailed { .. }),
        "{outcome:?}"
    );
    assert_eq!(outcome.bytes(), 1024);
    assert!(started.elapsed() >= idle);
    assert!(started.elapsed() < idle + Duration::from_secs(5));
}

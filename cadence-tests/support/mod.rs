//! Shared fixtures: a fake media host and a Cadence server on loopback.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, USER_AGENT};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use bytes::Bytes;
use cadence_core::config::CadenceConfig;
use cadence_core::relay::HttpUpstream;
use cadence_core::testing::ScriptedExtractionProvider;
use cadence_core::{ClientProfile, LocatorResolver, RelayPipe, RuntimeMode};
use cadence_search::CatalogSearchService;
use cadence_search::providers::MockSearchProvider;
use cadence_web::{AppState, router};
use futures::stream::{self, StreamExt};

/// Profile every fixture server is built with.
pub const PROFILE: &str = "desktop-browser";

/// Size of the `/media` body served by the fake host.
pub const MEDIA_LEN: usize = 1_000_000;

/// Bytes `/broken` sends before failing.
pub const BROKEN_AFTER: usize = 100_000;

const ENDLESS_CHUNK: usize = 16 * 1024;

/// Deterministic, non-repeating-looking audio bytes.
pub fn audio(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 131 + i / 256) % 251) as u8).collect()
}

#[derive(Clone)]
struct HostState {
    user_agent: String,
    media: Bytes,
    endless_reads: Arc<AtomicUsize>,
}

/// Media host that only answers requests carrying the expected user agent.
///
/// Routes:
/// - `/media` serves `MEDIA_LEN` bytes with a content length
/// - `/endless` never ends and counts every chunk produced
/// - `/stall` sends one chunk and then goes silent
/// - `/broken` sends some bytes and then resets the body
pub struct FakeMediaHost {
    pub addr: SocketAddr,
    endless_reads: Arc<AtomicUsize>,
}

impl FakeMediaHost {
    pub async fn start(user_agent: &str) -> Self {
        let endless_reads = Arc::new(AtomicUsize::new(0));
        let state = HostState {
            user_agent: user_agent.to_string(),
            media: Bytes::from(audio(MEDIA_LEN)),
            endless_reads: Arc::clone(&endless_reads),
        };

        let app = Router::new()
            .route("/media", get(media))
            .route("/endless", get(endless))
            .route("/stall", get(stall))
            .route("/broken", get(broken))
            .with_state(state);

        let addr = serve(app).await;
        Self {
            addr,
            endless_reads,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Chunks produced so far on `/endless`.
    pub fn endless_reads(&self) -> usize {
        self.endless_reads.load(Ordering::SeqCst)
    }
}

fn authorized(state: &HostState, headers: &HeaderMap) -> bool {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        == Some(state.user_agent.as_str())
}

async fn media(State(state): State<HostState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    ([(CONTENT_TYPE, "application/octet-stream")], state.media.clone()).into_response()
}

async fn endless(State(state): State<HostState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    let reads = Arc::clone(&state.endless_reads);
    let body = stream::repeat(()).map(move |()| {
        reads.fetch_add(1, Ordering::SeqCst);
        Ok::<_, io::Error>(Bytes::from(vec![7u8; ENDLESS_CHUNK]))
    });
    Body::from_stream(body).into_response()
}

async fn stall(State(state): State<HostState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    let body = stream::once(async { Ok::<_, io::Error>(Bytes::from(vec![1u8; 1024])) })
        .chain(stream::pending());
    Body::from_stream(body).into_response()
}

async fn broken(State(state): State<HostState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    // The pause lets headers and the first chunk reach the client before the reset.
    let body = stream::unfold(0u8, |step| async move {
        match step {
            0 => Some((Ok(Bytes::from(audio(BROKEN_AFTER))), 1)),
            1 => {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Some((Err(io::Error::other("connection reset by media host")), 2))
            }
            _ => None,
        }
    });
    Body::from_stream(body).into_response()
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Relay pipe wired to the real HTTP upstream client.
pub fn relay_pipe(provider: ScriptedExtractionProvider) -> RelayPipe {
    let config = CadenceConfig::for_testing();
    let profile = Arc::new(ClientProfile::builtin(PROFILE).unwrap());
    let resolver = Arc::new(LocatorResolver::new(
        Arc::new(provider),
        profile,
        &config.resolver,
    ));
    let upstream = HttpUpstream::new(&config.relay).unwrap();
    RelayPipe::new(resolver, Arc::new(upstream), config.relay)
}

/// Starts a Cadence server on loopback and returns its base URL.
pub async fn start_cadence(
    provider: ScriptedExtractionProvider,
    search: MockSearchProvider,
    static_dir: &Path,
) -> String {
    let config = CadenceConfig::for_testing();
    let relay = relay_pipe(provider);
    let state = AppState {
        profile: Arc::clone(relay.resolver().profile()),
        relay,
        search: CatalogSearchService::new(Arc::new(search), config.search),
        mode: RuntimeMode::Development,
        server_started_at: Instant::now(),
    };

    let addr = serve(router(state, static_dir)).await;
    format!("http://{addr}")
}

/// User agent of the fixture profile.
pub fn profile_user_agent() -> String {
    ClientProfile::builtin(PROFILE)
        .unwrap()
        .user_agent()
        .to_string()
}

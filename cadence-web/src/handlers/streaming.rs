//! Audio relay handlers
//!
//! The relay always proxies: the upstream locator is bound to this
//! server's network origin, so clients are never redirected to it.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, EXPIRES, PRAGMA};
use axum::http::{Response, StatusCode};
use cadence_core::ItemIdentifier;
use axum::response::IntoResponse;
use serde::Serialize;
use tracing::info;

use crate::errors::ApiError;
use crate::server::AppState;

/// Where a client should fetch audio for an item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub relay_url: String,
}

/// Returns the relay URL for an item without resolving it.
pub async fn stream_info(Path(id): Path<String>) -> Result<Json<StreamInfo>, ApiError> {
    let item = ItemIdentifier::parse(&id)?;
    Ok(Json(StreamInfo {
        relay_url: format!("/stream/{item}"),
    }))
}

/// Resolves an item and streams its audio through this server.
///
/// Failures before the first byte map to a bare status. Once the body has
/// started, upstream failures abort the connection and a dropped body
/// releases the upstream.
pub async fn relay_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let item = ItemIdentifier::parse(&id)?;
    let session = state.relay.open(&item).await?;

    let content_type = session
        .content_type(state.relay.config().default_content_type)
        .to_string();
    let content_length = session.content_length();

    info!(
        "Relaying {} as {} (session {})",
        item,
        content_type,
        session.id()
    );

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CACHE_CONTROL, "no-store, no-cache, must-revalidate")
        .header(PRAGMA, "no-cache")
        .header(EXPIRES, "0");
    if let Some(length) = content_length {
        response = response.header(CONTENT_LENGTH, length);
    }

    response
        .body(Body::from_stream(session.into_stream()))
        .map_err(|e| ApiError::Internal {
            reason: e.to_string(),
        })
}

/// `HEAD /stream/{id}` would resolve and open the upstream only to drop
/// the body, so it is refused.
pub async fn relay_head() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, [(ALLOW, "GET")])
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use cadence_core::testing::{MemoryUpstream, ScriptedExtractionProvider};
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::{app_with_relay, json_body};

    fn audio(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 256) as u8).collect()
    }

    #[tokio::test]
    async fn test_stream_info_points_at_relay() {
        let app = app_with_relay(ScriptedExtractionProvider::new(), MemoryUpstream::new(Vec::new(), 1));

        let response = app
            .oneshot(Request::get("/stream-info/abc123").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["relayUrl"], "/stream/abc123");
    }

    #[tokio::test]
    async fn test_relay_streams_upstream_bytes_with_headers() {
        let data = audio(200_000);
        let provider = ScriptedExtractionProvider::new().with_audio("song", "mem://song");
        let upstream = MemoryUpstream::new(data.clone(), 10_000);
        let app = app_with_relay(provider, upstream);

        let response = app
            .oneshot(Request::get("/stream/song").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "audio/mp4");
        assert_eq!(headers[CACHE_CONTROL], "no-store, no-cache, must-revalidate");
        assert_eq!(headers[PRAGMA], "no-cache");
        assert_eq!(headers[EXPIRES], "0");
        assert_eq!(headers[CONTENT_LENGTH], "200000");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), data.as_slice());
    }

    #[tokio::test]
    async fn test_unresolvable_item_is_not_found_with_empty_body() {
        let upstream = MemoryUpstream::new(audio(10), 10);
        let app = app_with_relay(
            ScriptedExtractionProvider::new().with_video_only("clip"),
            upstream.clone(),
        );

        for uri in ["/stream/clip", "/stream/missing"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
            assert!(body.is_empty());
        }
        assert_eq!(upstream.opens(), 0);
    }

    #[tokio::test]
    async fn test_upstream_open_failure_is_server_error() {
        let provider = ScriptedExtractionProvider::new().with_audio("song", "mem://song");
        let app = app_with_relay(provider, MemoryUpstream::new(Vec::new(), 1).failing_open(403));

        let response = app
            .oneshot(Request::get("/stream/song").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_head_is_refused_without_resolving() {
        let provider = ScriptedExtractionProvider::new().with_audio("song", "mem://song");
        let upstream = MemoryUpstream::new(audio(10), 10);
        let app = app_with_relay(provider.clone(), upstream.clone());

        let response = app
            .oneshot(Request::head("/stream/song").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET");
        assert_eq!(provider.calls(), 0);
        assert_eq!(upstream.opens(), 0);
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let provider = ScriptedExtractionProvider::new();
        let app = app_with_relay(provider.clone(), MemoryUpstream::new(Vec::new(), 1));

        let response = app
            .oneshot(Request::get("/stream/a%26b").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(provider.calls(), 0);
    }
}

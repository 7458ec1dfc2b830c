//! HTTP server for Cadence
//!
//! JSON search endpoints, the audio relay endpoint and the static
//! front-end, all served from one axum router.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::get;
use cadence_core::config::CadenceConfig;
use cadence_core::{ClientProfile, CoreComponents, RelayPipe, RuntimeMode};
use cadence_search::CatalogSearchService;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

use crate::handlers::{health, relay_head, relay_stream, search, similar, stream_info};

/// Shared state handed to every handler. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub relay: RelayPipe,
    pub search: CatalogSearchService,
    pub mode: RuntimeMode,
    pub profile: Arc<ClientProfile>,
    pub server_started_at: Instant,
}

impl AppState {
    pub fn new(components: CoreComponents, search: CatalogSearchService, mode: RuntimeMode) -> Self {
        Self {
            relay: components.relay,
            search,
            mode,
            profile: components.profile,
            server_started_at: Instant::now(),
        }
    }
}

/// Builds the application router.
///
/// Unknown paths fall through to the static directory, which serves
/// `index.html` at `/`.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/similar", get(similar))
        .route("/stream-info/{id}", get(stream_info))
        .route("/stream/{id}", get(relay_stream).head(relay_head))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Builds all components for `config` and serves until Ctrl-C.
///
/// # Errors
/// - Component construction failed (unknown profile, HTTP client setup)
/// - The listener could not be bound
pub async fn run_server(config: CadenceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mode = config.server.mode;
    let components = CoreComponents::build(&config)?;
    let search = CatalogSearchService::from_runtime_mode(mode, &config);
    let state = AppState::new(components, search, mode);

    let app = router(state, &config.server.static_dir);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        "Cadence running on http://{} in {} mode with profile {}",
        listener.local_addr()?,
        mode,
        config.resolver.profile
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Cadence stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; serve until the process is killed.
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use cadence_search::providers::MockSearchProvider;
    use tower::ServiceExt;

    use crate::test_support::app_with_static;

    #[tokio::test]
    async fn test_serves_front_end_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Cadence</h1>").unwrap();
        std::fs::write(dir.path().join("script.js"), "console.log('hi');").unwrap();

        let app = app_with_static(MockSearchProvider::with_tracks(0), dir.path());

        let index = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(index.status(), StatusCode::OK);
        let body = axum::body::to_bytes(index.into_body(), 1024).await.unwrap();
        assert_eq!(body.as_ref(), b"<h1>Cadence</h1>");

        let script = app
            .clone()
            .oneshot(Request::get("/script.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(script.status(), StatusCode::OK);

        let missing = app
            .oneshot(Request::get("/nope.css").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_is_permissive() {
        let app = app_with_static(MockSearchProvider::with_tracks(1), std::path::Path::new("."));

        let response = app
            .oneshot(
                Request::get("/search?q=x")
                    .header("Origin", "http://elsewhere.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}

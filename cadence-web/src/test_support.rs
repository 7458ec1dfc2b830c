//! Router builders for handler tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::Body;
use axum::http::Response;
use cadence_core::config::CadenceConfig;
use cadence_core::testing::{MemoryUpstream, ScriptedExtractionProvider};
use cadence_core::{ClientProfile, LocatorResolver, RelayPipe, RuntimeMode};
use cadence_search::CatalogSearchService;
use cadence_search::providers::MockSearchProvider;

use crate::server::{AppState, router};

fn state(
    provider: ScriptedExtractionProvider,
    upstream: MemoryUpstream,
    search: MockSearchProvider,
) -> AppState {
    let config = CadenceConfig::for_testing();
    let profile = Arc::new(ClientProfile::builtin("desktop-browser").unwrap());
    let resolver = Arc::new(LocatorResolver::new(
        Arc::new(provider),
        Arc::clone(&profile),
        &config.resolver,
    ));

    AppState {
        relay: RelayPipe::new(resolver, Arc::new(upstream), config.relay.clone()),
        search: CatalogSearchService::new(Arc::new(search), config.search.clone()),
        mode: RuntimeMode::Development,
        profile,
        server_started_at: Instant::now(),
    }
}

pub(crate) fn app_with_relay(
    provider: ScriptedExtractionProvider,
    upstream: MemoryUpstream,
) -> Router {
    let state = state(provider, upstream, MockSearchProvider::with_tracks(0));
    router(state, Path::new("does-not-exist"))
}

pub(crate) fn app_with_search(search: MockSearchProvider) -> Router {
    app_with_static(search, Path::new("does-not-exist"))
}

pub(crate) fn app_with_static(search: MockSearchProvider, static_dir: &Path) -> Router {
    let state = state(
        ScriptedExtractionProvider::new(),
        MemoryUpstream::new(Vec::new(), 1),
        search,
    );
    router(state, static_dir)
}

pub(crate) async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

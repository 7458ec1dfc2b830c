//! Component assembly in development mode.

use cadence_core::config::CadenceConfig;
use cadence_core::{CoreComponents, ItemIdentifier, RuntimeMode};
use cadence_search::CatalogSearchService;

use crate::support::{FakeMediaHost, MEDIA_LEN, audio, profile_user_agent};

fn development_config(media_url: Option<String>) -> CadenceConfig {
    let mut config = CadenceConfig::for_testing();
    config.server.mode = RuntimeMode::Development;
    config.server.dev_media_url = media_url;
    config
}

#[tokio::test]
async fn test_every_item_relays_the_development_media() {
    let host = FakeMediaHost::start(&profile_user_agent()).await;
    let components = CoreComponents::build(&development_config(Some(host.url("/media")))).unwrap();

    for id in ["demo00", "radio03"] {
        let item = ItemIdentifier::parse(id).unwrap();
        let mut sink = Vec::new();
        let outcome = components.relay.relay(&item, &mut sink).await.unwrap();

        assert!(outcome.is_completed(), "{id}: {outcome:?}");
        assert_eq!(sink.len(), MEDIA_LEN);
        assert_eq!(sink, audio(MEDIA_LEN));
    }
}

#[tokio::test]
async fn test_missing_development_media_is_not_found() {
    let components = CoreComponents::build(&development_config(None)).unwrap();
    let item = ItemIdentifier::parse("demo00").unwrap();

    let mut sink = Vec::new();
    let error = components.relay.relay(&item, &mut sink).await.unwrap_err();

    assert!(error.is_not_found());
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_demo_catalog_search_and_similar() {
    let config = development_config(None);
    let service = CatalogSearchService::from_runtime_mode(RuntimeMode::Development, &config);
    assert_eq!(service.provider_name(), "demo");

    let tracks = service.search("  night drive ").await.unwrap();
    assert!(!tracks.is_empty());
    assert!(tracks.len() <= config.search.result_cap);
    assert!(tracks.iter().all(|t| t.is_playable()));

    let seed = ItemIdentifier::parse("radio00").unwrap();
    let similar = service.similar(&seed).await;
    assert!(!similar.is_empty());
    assert!(similar.iter().all(|t| t.id != "radio00"));
}

//! Demo extraction provider for offline development.

use async_trait::async_trait;

use super::errors::ExtractionError;
use super::locator::{CandidateStream, MediaDescriptor};
use super::provider::ExtractionProvider;
use crate::item::ItemIdentifier;
use crate::profile::ClientProfile;

/// Resolves every item to one operator-supplied media URL.
///
/// Lets the front-end and relay be exercised without reaching the real
/// upstream. Without a configured URL every item is reported unavailable.
#[derive(Debug, Clone, Default)]
pub struct DemoExtractionProvider {
    media_url: Option<String>,
}

impl DemoExtractionProvider {
    pub fn new(media_url: Option<String>) -> Self {
        Self { media_url }
    }
}

#[async_trait]
impl ExtractionProvider for DemoExtractionProvider {
    async fn extract(
        &self,
        item: &ItemIdentifier,
        _profile: &ClientProfile,
    ) -> Result<MediaDescriptor, ExtractionError> {
        let Some(url) = &self.media_url else {
            return Err(ExtractionError::Unavailable {
                diagnostic: "no development media URL configured (CADENCE_DEV_MEDIA_URL)"
                    .to_string(),
            });
        };

        let ext = url
            .rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        Ok(MediaDescriptor {
            title: Some(format!("Demo track {item}")),
            uploader: Some("Cadence Demo".to_string()),
            duration_secs: None,
            candidates: vec![CandidateStream {
                format_id: "demo".to_string(),
                url: Some(url.clone()),
                audio_codec: Some("mp4a.40.2".to_string()),
                video_codec: Some("none".to_string()),
                ext,
                ..Default::default()
            }],
        })
    }

    fn name(&self) -> &'static str {
        "demo"
    }
}

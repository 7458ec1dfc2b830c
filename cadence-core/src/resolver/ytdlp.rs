//! yt-dlp backed extraction provider for production use.

use async_trait::async_trait;
use serde::Deserialize;

use super::errors::ExtractionError;
use super::locator::{CandidateStream, MediaDescriptor};
use super::provider::ExtractionProvider;
use crate::item::ItemIdentifier;
use crate::profile::ClientProfile;
use crate::ytdlp::{FailureKind, YtDlp, YtDlpError, watch_url};

/// Extraction provider that asks yt-dlp for the item's format list.
///
/// yt-dlp lists formats worst-first; candidates are reversed so the
/// descriptor is ordered most-preferred first.
#[derive(Debug, Clone)]
pub struct YtDlpProvider {
    ytdlp: YtDlp,
}

/// Subset of yt-dlp's info dictionary used for resolution.
#[derive(Debug, Deserialize)]
struct InfoDict {
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    formats: Vec<FormatDict>,
    #[serde(flatten)]
    selected: FormatDict,
}

#[derive(Debug, Default, Deserialize)]
struct FormatDict {
    format_id: Option<String>,
    url: Option<String>,
    acodec: Option<String>,
    vcodec: Option<String>,
    ext: Option<String>,
    protocol: Option<String>,
    abr: Option<f64>,
    filesize: Option<f64>,
}

impl From<FormatDict> for CandidateStream {
    fn from(format: FormatDict) -> Self {
        Self {
            format_id: format.format_id.unwrap_or_default(),
            url: format.url,
            audio_codec: format.acodec,
            video_codec: format.vcodec,
            ext: format.ext,
            protocol: format.protocol,
            bitrate_kbps: format.abr,
            content_length: format.filesize.map(|size| size as u64),
        }
    }
}

impl YtDlpProvider {
    pub fn new(ytdlp: YtDlp) -> Self {
        Self { ytdlp }
    }
}

#[async_trait]
impl ExtractionProvider for YtDlpProvider {
    async fn extract(
        &self,
        item: &ItemIdentifier,
        profile: &ClientProfile,
    ) -> Result<MediaDescriptor, ExtractionError> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--skip-download".to_string(),
            "--format".to_string(),
            "bestaudio/best".to_string(),
        ];
        args.extend(YtDlp::profile_args(profile));

        let info: InfoDict = self
            .ytdlp
            .run_json(&args, &watch_url(item))
            .await
            .map_err(extraction_error)?;

        Ok(descriptor_from_info(info))
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

fn descriptor_from_info(info: InfoDict) -> MediaDescriptor {
    let mut candidates: Vec<CandidateStream> = info
        .formats
        .into_iter()
        .rev()
        .map(CandidateStream::from)
        .collect();

    // Single-format extractors only report the selected format at top level.
    if candidates.is_empty() && info.selected.url.is_some() {
        candidates.push(CandidateStream::from(info.selected));
    }

    MediaDescriptor {
        title: info.title,
        uploader: info.uploader.or(info.channel),
        duration_secs: info.duration.map(|secs| secs.round() as u64),
        candidates,
    }
}

fn extraction_error(error: YtDlpError) -> ExtractionError {
    match &error {
        YtDlpError::Timeout { timeout } => ExtractionError::Timeout { timeout: *timeout },
        YtDlpError::Exited { diagnostic, .. } => {
            let diagnostic = diagnostic.clone();
            match error.kind() {
                FailureKind::NotFound => ExtractionError::NotFound { diagnostic },
                FailureKind::Unavailable => ExtractionError::Unavailable { diagnostic },
                FailureKind::Rejected => ExtractionError::Rejected { diagnostic },
                FailureKind::Other => ExtractionError::ProviderFailed { diagnostic },
            }
        }
        YtDlpError::Spawn { .. } | YtDlpError::InvalidOutput { .. } => {
            ExtractionError::ProviderFailed {
                diagnostic: error.to_string(),
            }
        }
    }
}

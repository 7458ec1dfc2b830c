//! Media descriptors returned by extraction providers and the locator
//! selected from them.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::item::ItemIdentifier;

/// Audio codec family of a candidate stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodecFamily {
    /// AAC (`mp4a.*`), decodable by browsers through `audio/mp4`
    Aac,
    Opus,
    Vorbis,
    Mp3,
    Other,
}

impl CodecFamily {
    /// Classifies a provider codec string such as `mp4a.40.2` or `opus`.
    pub fn from_codec(codec: &str) -> Self {
        let codec = codec.to_ascii_lowercase();
        if codec.starts_with("mp4a") || codec == "aac" {
            Self::Aac
        } else if codec.starts_with("opus") {
            Self::Opus
        } else if codec.starts_with("vorbis") {
            Self::Vorbis
        } else if codec.starts_with("mp3") {
            Self::Mp3
        } else {
            Self::Other
        }
    }
}

impl std::str::FromStr for CodecFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aac" | "mp4a" => Ok(Self::Aac),
            "opus" => Ok(Self::Opus),
            "vorbis" => Ok(Self::Vorbis),
            "mp3" => Ok(Self::Mp3),
            _ => Err(format!(
                "Invalid codec family: '{s}'. Valid options are: aac, opus, vorbis, mp3"
            )),
        }
    }
}

/// One stream offered by the extraction provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateStream {
    pub format_id: String,
    pub url: Option<String>,
    /// Audio codec, `Some("none")` when the stream carries no audio
    pub audio_codec: Option<String>,
    /// Video codec, `Some("none")` when the stream carries no video
    pub video_codec: Option<String>,
    /// Container extension (`m4a`, `webm`, ...)
    pub ext: Option<String>,
    /// Transfer protocol (`https`, `m3u8_native`, ...), when the provider reports it
    pub protocol: Option<String>,
    pub bitrate_kbps: Option<f64>,
    pub content_length: Option<u64>,
}

impl CandidateStream {
    /// True when the stream carries audio and is known to carry no video.
    ///
    /// A stream whose video codec is not reported is treated as possibly
    /// carrying video.
    pub fn is_audio_only(&self) -> bool {
        let has_audio = self
            .audio_codec
            .as_deref()
            .is_some_and(|codec| !codec.is_empty() && codec != "none");
        let no_video = self.video_codec.as_deref() == Some("none");
        has_audio && no_video
    }

    /// True when the URL serves the media bytes in one plain HTTP response.
    ///
    /// Manifest protocols (HLS, DASH) point at a playlist instead. Providers
    /// that do not report a protocol are taken to serve plain HTTP.
    pub fn is_progressive(&self) -> bool {
        match self.protocol.as_deref() {
            None => true,
            Some(protocol) => matches!(protocol, "http" | "https"),
        }
    }

    pub fn codec_family(&self) -> Option<CodecFamily> {
        self.audio_codec.as_deref().map(CodecFamily::from_codec)
    }
}

/// Everything the extraction provider knows about an item.
///
/// Candidates are ordered most-preferred first, as the provider ranks them.
#[derive(Debug, Clone)]
pub struct MediaDescriptor {
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration_secs: Option<u64>,
    pub candidates: Vec<CandidateStream>,
}

/// A resolved, short-lived, origin-bound stream locator.
///
/// The URL is only valid when fetched from this process's network origin
/// shortly after resolution. It is never handed to clients and is redacted
/// from `Debug` output.
#[derive(Clone)]
pub struct MediaLocator {
    item: ItemIdentifier,
    url: String,
    pub format_id: String,
    pub codec: CodecFamily,
    pub audio_codec: String,
    pub ext: Option<String>,
    pub content_length: Option<u64>,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration_secs: Option<u64>,
    pub resolved_at: Instant,
}

impl MediaLocator {
    /// Builds a locator from the selected candidate.
    ///
    /// Returns `None` when the candidate has no URL.
    pub fn from_candidate(
        item: ItemIdentifier,
        descriptor: &MediaDescriptor,
        candidate: &CandidateStream,
    ) -> Option<Self> {
        let url = candidate.url.clone()?;
        let audio_codec = candidate.audio_codec.clone().unwrap_or_default();
        Some(Self {
            item,
            url,
            format_id: candidate.format_id.clone(),
            codec: CodecFamily::from_codec(&audio_codec),
            audio_codec,
            ext: candidate.ext.clone(),
            content_length: candidate.content_length,
            title: descriptor.title.clone(),
            uploader: descriptor.uploader.clone(),
            duration_secs: descriptor.duration_secs,
            resolved_at: Instant::now(),
        })
    }

    pub fn item(&self) -> &ItemIdentifier {
        &self.item
    }

    /// The origin-bound upstream URL. Only the relay may dereference it.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Audio MIME type of the container, when the extension is recognized.
    pub fn container_mime(&self) -> Option<&'static str> {
        match self.ext.as_deref()? {
            "m4a" | "mp4" => Some("audio/mp4"),
            "webm" | "weba" => Some("audio/webm"),
            "mp3" => Some("audio/mpeg"),
            "ogg" | "oga" => Some("audio/ogg"),
            "aac" => Some("audio/aac"),
            _ => None,
        }
    }
}

impl std::fmt::Debug for MediaLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaLocator")
            .field("item", &self.item)
            .field("url", &"<redacted>")
            .field("format_id", &self.format_id)
            .field("codec", &self.codec)
            .field("audio_codec", &self.audio_codec)
            .field("ext", &self.ext)
            .field("content_length", &self.content_length)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

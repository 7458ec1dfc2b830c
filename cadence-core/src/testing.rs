//! Scripted providers and in-memory upstreams for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream;

use crate::item::ItemIdentifier;
use crate::profile::ClientProfile;
use crate::relay::{UpstreamError, UpstreamFetcher, UpstreamStream};
use crate::resolver::{
    CandidateStream, ExtractionError, ExtractionProvider, MediaDescriptor, MediaLocator,
};

/// Extraction provider answering from a fixed table of items.
///
/// Unknown items are reported as not found. Clones share the call counter.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExtractionProvider {
    items: HashMap<String, MediaDescriptor>,
    reject_first: usize,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedExtractionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an item offering a muxed video stream and an AAC audio-only stream.
    pub fn with_audio(mut self, id: &str, url: &str) -> Self {
        let descriptor = MediaDescriptor {
            title: Some(format!("Track {id}")),
            uploader: Some("Scripted Artist".to_string()),
            duration_secs: Some(200),
            candidates: vec![
                CandidateStream {
                    format_id: "18".to_string(),
                    url: Some(format!("{url}?muxed")),
                    audio_codec: Some("mp4a.40.2".to_string()),
                    video_codec: Some("avc1.42001E".to_string()),
                    ext: Some("mp4".to_string()),
                    ..Default::default()
                },
                CandidateStream {
                    format_id: "140".to_string(),
                    url: Some(url.to_string()),
                    audio_codec: Some("mp4a.40.2".to_string()),
                    video_codec: Some("none".to_string()),
                    ext: Some("m4a".to_string()),
                    bitrate_kbps: Some(129.5),
                    ..Default::default()
                },
            ],
        };
        self.items.insert(id.to_string(), descriptor);
        self
    }

    /// Registers an item whose only stream carries video.
    pub fn with_video_only(mut self, id: &str) -> Self {
        let descriptor = MediaDescriptor {
            title: Some(format!("Clip {id}")),
            uploader: None,
            duration_secs: None,
            candidates: vec![CandidateStream {
                format_id: "137".to_string(),
                url: Some("mem://video".to_string()),
                audio_codec: Some("none".to_string()),
                video_codec: Some("avc1.640028".to_string()),
                ext: Some("mp4".to_string()),
                ..Default::default()
            }],
        };
        self.items.insert(id.to_string(), descriptor);
        self
    }

    /// Rejects the first `count` calls as automated traffic.
    pub fn rejecting_first(mut self, count: usize) -> Self {
        self.reject_first = count;
        self
    }

    /// Delays every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of extraction calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionProvider for ScriptedExtractionProvider {
    async fn extract(
        &self,
        item: &ItemIdentifier,
        _profile: &ClientProfile,
    ) -> Result<MediaDescriptor, ExtractionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if call < self.reject_first {
            return Err(ExtractionError::Rejected {
                diagnostic: "Sign in to confirm you're not a bot".to_string(),
            });
        }
        self.items
            .get(item.as_str())
            .cloned()
            .ok_or_else(|| ExtractionError::NotFound {
                diagnostic: format!("Video unavailable: {item}"),
            })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Upstream serving a fixed byte buffer in chunks.
///
/// Counts opens and body reads so tests can observe backpressure and
/// release. Clones share the counters.
#[derive(Debug, Clone)]
pub struct MemoryUpstream {
    data: Bytes,
    chunk_size: usize,
    open_status: Option<u16>,
    stall_after: Option<usize>,
    fail_after: Option<usize>,
    opens: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
    last_user_agent: Arc<Mutex<Option<String>>>,
}

impl MemoryUpstream {
    pub fn new(data: impl Into<Bytes>, chunk_size: usize) -> Self {
        Self {
            data: data.into(),
            chunk_size: chunk_size.max(1),
            open_status: None,
            stall_after: None,
            fail_after: None,
            opens: Arc::new(AtomicUsize::new(0)),
            reads: Arc::new(AtomicUsize::new(0)),
            last_user_agent: Arc::new(Mutex::new(None)),
        }
    }

    /// Answers every open with `status` instead of a body.
    pub fn failing_open(mut self, status: u16) -> Self {
        self.open_status = Some(status);
        self
    }

    /// Stops producing bytes, without ending, after `chunks` chunks.
    pub fn stalling_after(mut self, chunks: usize) -> Self {
        self.stall_after = Some(chunks);
        self
    }

    /// Fails the body with a reset after `chunks` chunks.
    pub fn failing_after(mut self, chunks: usize) -> Self {
        self.fail_after = Some(chunks);
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of body chunks pulled so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// User-Agent presented on the most recent open.
    pub fn last_user_agent(&self) -> Option<String> {
        self.last_user_agent
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
    }
}

#[async_trait]
impl UpstreamFetcher for MemoryUpstream {
    async fn open(
        &self,
        _locator: &MediaLocator,
        profile: &ClientProfile,
    ) -> Result<UpstreamStream, UpstreamError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.last_user_agent.lock() {
            *slot = Some(profile.user_agent().to_string());
        }
        if let Some(status) = self.open_status {
            return Err(UpstreamError::Status { status });
        }

        let data = self.data.clone();
        let chunk_size = self.chunk_size;
        let stall_after = self.stall_after;
        let fail_after = self.fail_after;
        let reads = Arc::clone(&self.reads);

        let body = stream::unfold(0usize, move |index| {
            let data = data.clone();
            let reads = Arc::clone(&reads);
            async move {
                let start = index.checked_mul(chunk_size)?;
                if start >= data.len() {
                    return None;
                }
                if stall_after.is_some_and(|n| index >= n) {
                    futures::future::pending::<()>().await;
                }
                if fail_after.is_some_and(|n| index >= n) {
                    return Some((Err(std::io::Error::other("connection reset")), usize::MAX));
                }
                reads.fetch_add(1, Ordering::SeqCst);
                let end = (start + chunk_size).min(data.len());
                Some((Ok(data.slice(start..end)), index + 1))
            }
        })
        .boxed();

        Ok(UpstreamStream {
            content_length: Some(self.data.len() as u64),
            content_type: None,
            body,
        })
    }
}

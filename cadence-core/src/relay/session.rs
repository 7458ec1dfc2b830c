//! A single relay from one upstream response to one client sink.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::segmenter::{Segmenter, with_idle_timeout};
use super::upstream::UpstreamStream;
use crate::item::ItemIdentifier;
use crate::resolver::MediaLocator;

/// How a relay ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The upstream reached end-of-stream and every byte was forwarded.
    Completed { bytes: u64, segments: u64 },
    /// The client went away; the upstream is released.
    ClientDisconnected { bytes: u64, segments: u64 },
    /// The upstream failed or stalled after streaming began.
    UpstreamFailed {
        bytes: u64,
        segments: u64,
        reason: String,
    },
}

impl RelayOutcome {
    pub fn bytes(&self) -> u64 {
        match self {
            Self::Completed { bytes, .. }
            | Self::ClientDisconnected { bytes, .. }
            | Self::UpstreamFailed { bytes, .. } => *bytes,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// An opened relay: the upstream has answered and nothing has been sent yet.
#[derive(Debug)]
pub struct RelaySession {
    id: Uuid,
    item: ItemIdentifier,
    content_type: Option<String>,
    content_length: Option<u64>,
    upstream: UpstreamStream,
    segment_size: usize,
    idle_timeout: Duration,
}

impl RelaySession {
    pub fn new(
        locator: &MediaLocator,
        upstream: UpstreamStream,
        segment_size: usize,
        idle_timeout: Duration,
    ) -> Self {
        // Container from the locator wins; upstream hosts often send
        // a generic `application/octet-stream`.
        let content_type = locator
            .container_mime()
            .map(str::to_string)
            .or_else(|| {
                upstream
                    .content_type
                    .clone()
                    .filter(|ct| ct.starts_with("audio/"))
            });

        Self {
            id: Uuid::new_v4(),
            item: locator.item().clone(),
            content_type,
            content_length: upstream.content_length,
            upstream,
            segment_size,
            idle_timeout,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn item(&self) -> &ItemIdentifier {
        &self.item
    }

    /// Audio MIME type to declare, falling back to `default`.
    pub fn content_type<'a>(&'a self, default: &'a str) -> &'a str {
        self.content_type.as_deref().unwrap_or(default)
    }

    /// Exact body length, when the upstream declared one.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Starts pulling the upstream, yielding fixed-size segments.
    pub fn into_stream(self) -> RelayStream {
        let body = with_idle_timeout(self.upstream.body, self.idle_timeout);
        debug!(
            "Relay {} started for {} ({:?} bytes declared)",
            self.id, self.item, self.content_length
        );
        RelayStream {
            inner: Segmenter::new(body, self.segment_size),
            tracker: RelayTracker {
                id: self.id,
                item: self.item,
                bytes: 0,
                segments: 0,
                started: Instant::now(),
                outcome: None,
            },
        }
    }

    /// Relays the whole stream into `sink`.
    ///
    /// A write failure is treated as the client going away.
    pub async fn pipe_to<W>(self, sink: &mut W) -> RelayOutcome
    where
        W: AsyncWrite + Unpin,
    {
        let mut stream = self.into_stream();

        while let Some(segment) = stream.next().await {
            let Ok(segment) = segment else {
                break;
            };
            if let Err(e) = sink.write_all(&segment).await {
                debug!("Relay {} sink write failed: {}", stream.tracker.id, e);
                return stream.tracker.finish_disconnected();
            }
        }

        if let Err(e) = sink.flush().await {
            debug!("Relay {} sink flush failed: {}", stream.tracker.id, e);
        }

        if let Some(outcome) = stream.outcome() {
            return outcome.clone();
        }
        stream.tracker.finish_disconnected()
    }
}

/// Segment stream of a relay in progress.
///
/// Dropping it before the upstream finished (for example when the HTTP
/// client disconnects) releases the upstream and records a disconnect.
pub struct RelayStream {
    inner: Segmenter<BoxStream<'static, std::io::Result<Bytes>>>,
    tracker: RelayTracker,
}

impl RelayStream {
    /// The outcome, once the stream has ended.
    pub fn outcome(&self) -> Option<&RelayOutcome> {
        self.tracker.outcome.as_ref()
    }
}

impl Stream for RelayStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.tracker.outcome.is_some() {
            return Poll::Ready(None);
        }

        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(segment))) => {
                this.tracker.record(segment.len());
                Poll::Ready(Some(Ok(segment)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.tracker.finish_failed(e.to_string());
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.tracker.finish_completed();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

struct RelayTracker {
    id: Uuid,
    item: ItemIdentifier,
    bytes: u64,
    segments: u64,
    started: Instant,
    outcome: Option<RelayOutcome>,
}

impl RelayTracker {
    fn record(&mut self, len: usize) {
        self.bytes += len as u64;
        self.segments += 1;
    }

    fn finish_completed(&mut self) -> RelayOutcome {
        info!(
            "Relay {} for {} completed: {} bytes in {} segments ({:?})",
            self.id,
            self.item,
            self.bytes,
            self.segments,
            self.started.elapsed()
        );
        self.store(RelayOutcome::Completed {
            bytes: self.bytes,
            segments: self.segments,
        })
    }

    fn finish_failed(&mut self, reason: String) -> RelayOutcome {
        warn!(
            "Relay {} for {} aborted after {} bytes: {}",
            self.id, self.item, self.bytes, reason
        );
        self.store(RelayOutcome::UpstreamFailed {
            bytes: self.bytes,
            segments: self.segments,
            reason,
        })
    }

    fn finish_disconnected(&mut self) -> RelayOutcome {
        debug!(
            "Relay {} for {} ended by client after {} bytes ({:?})",
            self.id,
            self.item,
            self.bytes,
            self.started.elapsed()
        );
        self.store(RelayOutcome::ClientDisconnected {
            bytes: self.bytes,
            segments: self.segments,
        })
    }

    fn store(&mut self, outcome: RelayOutcome) -> RelayOutcome {
        self.outcome = Some(outcome.clone());
        outcome
    }
}

impl Drop for RelayTracker {
    fn drop(&mut self) {
        if self.outcome.is_none() {
            self.finish_disconnected();
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;
    use crate::resolver::{CandidateStream, MediaDescriptor};

    fn locator(ext: Option<&str>) -> MediaLocator {
        let descriptor = MediaDescriptor {
            title: None,
            uploader: None,
            duration_secs: None,
            candidates: Vec::new(),
        };
        let candidate = CandidateStream {
            format_id: "140".to_string(),
            url: Some("http://upstream.test/a".to_string()),
            audio_codec: Some("mp4a.40.2".to_string()),
            video_codec: Some("none".to_string()),
            ext: ext.map(str::to_string),
            ..Default::default()
        };
        MediaLocator::from_candidate(
            ItemIdentifier::parse("abc").unwrap(),
            &descriptor,
            &candidate,
        )
        .unwrap()
    }

    fn upstream(
        items: Vec<std::io::Result<Bytes>>,
        content_type: Option<&str>,
    ) -> UpstreamStream {
        let total = items
            .iter()
            .map(|item| item.as_ref().map_or(0, |b| b.len() as u64))
            .sum();
        UpstreamStream {
            content_length: Some(total),
            content_type: content_type.map(str::to_string),
            body: stream::iter(items).boxed(),
        }
    }

    #[tokio::test]
    async fn test_pipe_to_forwards_every_byte() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let items = data
            .chunks(77)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        let session = RelaySession::new(
            &locator(Some("m4a")),
            upstream(items, None),
            256,
            Duration::from_secs(1),
        );
        assert_eq!(session.content_length(), Some(1000));

        let mut sink = Vec::new();
        let outcome = session.pipe_to(&mut sink).await;

        assert_eq!(sink, data);
        assert_eq!(
            outcome,
            RelayOutcome::Completed {
                bytes: 1000,
                segments: 4
            }
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_reported() {
        let items = vec![
            Ok(Bytes::from_static(b"0123456789")),
            Err(std::io::Error::other("connection reset")),
        ];
        let session = RelaySession::new(
            &locator(None),
            upstream(items, None),
            4,
            Duration::from_secs(1),
        );

        let mut sink = Vec::new();
        let outcome = session.pipe_to(&mut sink).await;

        assert_eq!(sink, b"0123456789");
        assert!(matches!(
            outcome,
            RelayOutcome::UpstreamFailed { bytes: 10, .. }
        ));
    }

    #[tokio::test]
    async fn test_dropped_stream_stops_pulling() {
        let session = RelaySession::new(
            &locator(None),
            upstream(
                vec![
                    Ok(Bytes::from_static(b"aaaa")),
                    Ok(Bytes::from_static(b"bbbb")),
                ],
                None,
            ),
            4,
            Duration::from_secs(1),
        );

        let mut stream = session.into_stream();
        assert_eq!(stream.next().await.unwrap().unwrap(), "aaaa");
        assert!(stream.outcome().is_none());
        drop(stream);
    }

    #[test]
    fn test_content_type_selection() {
        let from_container = RelaySession::new(
            &locator(Some("webm")),
            upstream(Vec::new(), Some("application/octet-stream")),
            4,
            Duration::from_secs(1),
        );
        assert_eq!(from_container.content_type("audio/mp4"), "audio/webm");

        let from_upstream = RelaySession::new(
            &locator(None),
            upstream(Vec::new(), Some("audio/ogg")),
            4,
            Duration::from_secs(1),
        );
        assert_eq!(from_upstream.content_type("audio/mp4"), "audio/ogg");

        let fallback = RelaySession::new(
            &locator(None),
            upstream(Vec::new(), Some("text/html")),
            4,
            Duration::from_secs(1),
        );
        assert_eq!(fallback.content_type("audio/mp4"), "audio/mp4");
    }
}

//! Fixed-size re-chunking and idle detection for upstream byte streams.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};

/// Re-chunks a byte stream into segments of exactly `segment_size` bytes.
///
/// Only the final segment may be shorter. When the inner stream fails,
/// bytes already buffered are emitted before the error so the client
/// receives everything the upstream delivered.
pub struct Segmenter<S> {
    inner: S,
    buffer: BytesMut,
    segment_size: usize,
    done: bool,
    pending_error: Option<std::io::Error>,
}

impl<S> Segmenter<S>
where
    S: Stream<Item = std::io::Result<Bytes>> + Unpin,
{
    pub fn new(inner: S, segment_size: usize) -> Self {
        let segment_size = segment_size.max(1);
        Self {
            inner,
            buffer: BytesMut::with_capacity(segment_size),
            segment_size,
            done: false,
            pending_error: None,
        }
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }
}

impl<S> Stream for Segmenter<S>
where
    S: Stream<Item = std::io::Result<Bytes>> + Unpin,
{
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.buffer.len() >= this.segment_size {
                let segment = this.buffer.split_to(this.segment_size).freeze();
                return Poll::Ready(Some(Ok(segment)));
            }

            if this.done {
                if !this.buffer.is_empty() {
                    return Poll::Ready(Some(Ok(this.buffer.split().freeze())));
                }
                return Poll::Ready(this.pending_error.take().map(Err));
            }

            match this.inner.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(chunk))) => this.buffer.extend_from_slice(&chunk),
                Poll::Ready(Some(Err(e))) => {
                    this.done = true;
                    this.pending_error = Some(e);
                }
                Poll::Ready(None) => this.done = true,
            }
        }
    }
}

/// Ends `stream` with a `TimedOut` error when no item arrives within `idle`.
///
/// The deadline restarts on every item, so a slow but steady upstream is
/// never cut off.
pub fn with_idle_timeout(
    stream: BoxStream<'static, std::io::Result<Bytes>>,
    idle: Duration,
) -> BoxStream<'static, std::io::Result<Bytes>> {
    stream::unfold(Some(stream), move |state| async move {
        let mut inner = state?;
        match tokio::time::timeout(idle, inner.next()).await {
            Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(inner))),
            Ok(Some(Err(e))) => Some((Err(e), None)),
            Ok(None) => None,
            Err(_) => Some((
                Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("upstream idle for {idle:?}"),
                )),
                None,
            )),
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use proptest::prelude::*;

    use super::*;

    fn chunks(sizes: &[usize]) -> (Vec<u8>, Vec<std::io::Result<Bytes>>) {
        let mut all = Vec::new();
        let mut out = Vec::new();
        let mut next = 0u8;
        for &size in sizes {
            let chunk: Vec<u8> = (0..size)
                .map(|_| {
                    next = next.wrapping_add(1);
                    next
                })
                .collect();
            all.extend_from_slice(&chunk);
            out.push(Ok(Bytes::from(chunk)));
        }
        (all, out)
    }

    #[tokio::test]
    async fn test_segments_have_exact_size() {
        let (expected, input) = chunks(&[10, 3, 7, 25, 1]);
        let segments: Vec<Bytes> = Segmenter::new(stream::iter(input), 8)
            .try_collect()
            .await
            .unwrap();

        let sizes: Vec<usize> = segments.iter().map(Bytes::len).collect();
        assert_eq!(sizes, vec![8, 8, 8, 8, 8, 6]);
        assert_eq!(segments.concat(), expected);
    }

    #[tokio::test]
    async fn test_empty_stream_yields_nothing() {
        let input: Vec<std::io::Result<Bytes>> = Vec::new();
        let mut segmenter = Segmenter::new(stream::iter(input), 8);
        assert!(segmenter.next().await.is_none());
    }

    #[tokio::test]
    async fn test_buffered_bytes_flushed_before_error() {
        let (expected, mut input) = chunks(&[5, 6]);
        input.push(Err(std::io::Error::other("reset")));
        input.push(Ok(Bytes::from_static(b"never")));

        let mut segmenter = Segmenter::new(stream::iter(input), 4);
        let mut delivered = Vec::new();
        let mut error = None;
        while let Some(item) = segmenter.next().await {
            match item {
                Ok(segment) => delivered.extend_from_slice(&segment),
                Err(e) => error = Some(e),
            }
        }

        assert_eq!(delivered, expected);
        assert_eq!(error.unwrap().to_string(), "reset");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_ends_stalled_stream() {
        let stalled = stream::once(async { Ok(Bytes::from_static(b"head")) })
            .chain(stream::pending())
            .boxed();
        let mut guarded = with_idle_timeout(stalled, Duration::from_secs(5));

        assert_eq!(guarded.next().await.unwrap().unwrap(), "head");
        let err = guarded.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
        assert!(guarded.next().await.is_none());
    }

    proptest! {
        #[test]
        fn test_output_is_byte_identical(
            sizes in proptest::collection::vec(0usize..300, 0..20),
            segment_size in 1usize..128,
        ) {
            let (expected, input) = chunks(&sizes);
            let segments: Vec<Bytes> = futures::executor::block_on(
                Segmenter::new(stream::iter(input), segment_size).try_collect(),
            )
            .unwrap();

            prop_assert_eq!(segments.concat(), expected);
            if let Some((last, full)) = segments.split_last() {
                prop_assert!(full.iter().all(|s| s.len() == segment_size));
                prop_assert!(!last.is_empty() && last.len() <= segment_size);
            }
        }
    }
}

//! Upstream byte-stream fetchers.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};

use super::errors::UpstreamError;
use crate::config::RelayConfig;
use crate::profile::ClientProfile;
use crate::resolver::MediaLocator;

/// An opened upstream response, not yet read.
pub struct UpstreamStream {
    /// Length declared by the upstream, when present
    pub content_length: Option<u64>,
    /// Content type declared by the upstream, when present
    pub content_type: Option<String>,
    pub body: BoxStream<'static, std::io::Result<Bytes>>,
}

impl Debug for UpstreamStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamStream")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Opens the byte stream behind a media locator.
#[async_trait]
pub trait UpstreamFetcher: Send + Sync + Debug {
    /// Issues the upstream request presenting `profile`.
    ///
    /// Returns once response headers have arrived; the body is pulled
    /// lazily as the client consumes it.
    ///
    /// # Errors
    /// - `UpstreamError::Connect` - connection could not be established
    /// - `UpstreamError::Timeout` - no response headers within the deadline
    /// - `UpstreamError::Status` - upstream answered with a non-success status
    async fn open(
        &self,
        locator: &MediaLocator,
        profile: &ClientProfile,
    ) -> Result<UpstreamStream, UpstreamError>;
}

/// HTTP fetcher backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    headers_timeout: Duration,
}

impl HttpUpstream {
    /// Builds the shared client.
    ///
    /// # Errors
    /// - `UpstreamError::Client` - TLS or connector initialization failed
    pub fn new(config: &RelayConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| UpstreamError::Client {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            headers_timeout: config.headers_timeout,
        })
    }
}

#[async_trait]
impl UpstreamFetcher for HttpUpstream {
    async fn open(
        &self,
        locator: &MediaLocator,
        profile: &ClientProfile,
    ) -> Result<UpstreamStream, UpstreamError> {
        let request = self
            .client
            .get(locator.url())
            .headers(profile.header_map().clone())
            .send();

        let response = match tokio::time::timeout(self.headers_timeout, request).await {
            Err(_) => {
                return Err(UpstreamError::Timeout {
                    timeout: self.headers_timeout,
                });
            }
            Ok(Err(e)) if e.is_timeout() => {
                return Err(UpstreamError::Timeout {
                    timeout: self.headers_timeout,
                });
            }
            // Strip the URL: it carries signed query parameters.
            Ok(Err(e)) => {
                return Err(UpstreamError::Connect {
                    reason: e.without_url().to_string(),
                });
            }
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|len| len.parse::<u64>().ok());

        let body = response
            .bytes_stream()
            .map_err(|e| std::io::Error::other(e.without_url()))
            .boxed();

        Ok(UpstreamStream {
            content_length,
            content_type,
            body,
        })
    }
}

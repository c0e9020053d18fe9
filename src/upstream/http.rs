//! HTTP upstream connector
//!
//! reqwest-based implementation of [`UpstreamConnector`]. Sends the
//! `Icy-MetaData: 1` request header and reads the `icy-metaint` response
//! header; the body is consumed as a chunk stream.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::Notify;

use crate::protocol::constants::{
    DEFAULT_UPSTREAM_TIMEOUT_SECS, DEFAULT_USER_AGENT, ICY_METADATA_HEADER, ICY_METAINT_HEADER,
};

use super::{ByteSource, SourceHandle, UpstreamConnector, UpstreamError};

/// Upstream request configuration.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// User-Agent sent to origins.
    pub user_agent: String,

    /// TCP connect timeout.
    pub connect_timeout: Duration,

    /// Per-read timeout on the response body.
    pub read_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl UpstreamConfig {
    /// Set the User-Agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// Connector backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    /// Build a connector from the given configuration.
    ///
    /// Note: no total-request timeout is set; ICY streams are endless by
    /// design, so only connect and per-read timeouts apply.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(|e| UpstreamError::Connect(e.to_string()))?;

        Ok(Self { client })
    }
}

impl UpstreamConnector for HttpConnector {
    type Source = HttpByteSource;

    async fn connect(&self, url: &str) -> Result<HttpByteSource, UpstreamError> {
        let response = self
            .client
            .get(url)
            .header(ICY_METADATA_HEADER, "1")
            .send()
            .await
            .map_err(|e| UpstreamError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        // Absent or non-numeric icy-metaint means no embedded metadata
        let meta_interval = response
            .headers()
            .get(ICY_METAINT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            metaint = meta_interval,
            "Upstream connected"
        );

        Ok(HttpByteSource {
            meta_interval,
            stream: Box::pin(response.bytes_stream()),
            cancel: CancelHandle::default(),
        })
    }
}

/// Live HTTP response body as a [`ByteSource`].
pub struct HttpByteSource {
    meta_interval: usize,
    stream: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    cancel: CancelHandle,
}

impl ByteSource for HttpByteSource {
    fn meta_interval(&self) -> usize {
        self.meta_interval
    }

    fn handle(&self) -> Box<dyn SourceHandle> {
        Box::new(self.cancel.clone())
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, UpstreamError> {
        if self.cancel.is_shut_down() {
            return Ok(None);
        }

        tokio::select! {
            _ = self.cancel.inner.notify.notified() => Ok(None),
            item = self.stream.next() => match item {
                Some(Ok(chunk)) => Ok(Some(chunk)),
                Some(Err(e)) => Err(UpstreamError::Transport(e.to_string())),
                None => Ok(None),
            },
        }
    }
}

/// Cancellation flag shared between a source and its handles.
///
/// Dropping the response body (when the read loop exits) is what actually
/// closes the connection; the handle just makes the read loop exit.
#[derive(Clone, Default)]
struct CancelHandle {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    shut_down: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }
}

impl SourceHandle for CancelHandle {
    fn shutdown(&self) {
        if !self.inner.shut_down.swap(true, Ordering::AcqRel) {
            // notify_one stores a permit, so a shutdown that races ahead of
            // the reader's next select is not lost
            self.inner.notify.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UpstreamConfig::default();

        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.read_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("icy-relay"));
    }

    #[test]
    fn test_config_builder() {
        let config = UpstreamConfig::default()
            .user_agent("test-agent")
            .connect_timeout(Duration::from_secs(5))
            .read_timeout(Duration::from_secs(10));

        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_shutdown_idempotent() {
        let handle = CancelHandle::default();

        handle.shutdown();
        handle.shutdown();

        assert!(handle.is_shut_down());
    }
}

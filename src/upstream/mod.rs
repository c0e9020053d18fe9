//! Upstream byte sources
//!
//! The registry never talks to an HTTP client directly. It sees upstream
//! streams through the [`UpstreamConnector`]/[`ByteSource`] traits, which
//! decouples pool logic from the transport and lets tests substitute
//! scripted sources for real network connections.

pub mod fallback;
pub mod http;

use std::future::Future;

use bytes::Bytes;

pub use http::{HttpConnector, UpstreamConfig};

/// Error establishing or reading an upstream stream.
#[derive(Debug, Clone)]
pub enum UpstreamError {
    /// Connection could not be established.
    Connect(String),
    /// The origin answered with a non-success status.
    Status(u16),
    /// The connection failed mid-stream.
    Transport(String),
    /// The stream ended (or declared `icy-metaint: 0`) before any metadata.
    NoMetadata,
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamError::Connect(msg) => write!(f, "Upstream connect failed: {}", msg),
            UpstreamError::Status(code) => write!(f, "Upstream returned HTTP {}", code),
            UpstreamError::Transport(msg) => write!(f, "Upstream transport error: {}", msg),
            UpstreamError::NoMetadata => write!(f, "Upstream carried no metadata"),
        }
    }
}

impl std::error::Error for UpstreamError {}

/// Opens upstream connections for stream URLs.
pub trait UpstreamConnector: Send + Sync + 'static {
    /// The source type produced by [`connect`](Self::connect).
    type Source: ByteSource;

    /// Open a connection to the stream URL, requesting ICY metadata, and
    /// resolve once response headers (including `icy-metaint`) are in.
    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Source, UpstreamError>> + Send;
}

impl<C: UpstreamConnector> UpstreamConnector for std::sync::Arc<C> {
    type Source = C::Source;

    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Source, UpstreamError>> + Send {
        (**self).connect(url)
    }
}

/// One live upstream stream: the declared metadata interval plus an
/// incremental chunk reader.
pub trait ByteSource: Send + 'static {
    /// The `icy-metaint` value declared by the origin (0 = no metadata).
    fn meta_interval(&self) -> usize;

    /// A handle that can shut this source down from outside the read loop.
    fn handle(&self) -> Box<dyn SourceHandle>;

    /// Await the next chunk. `Ok(None)` means graceful end of stream (or
    /// that the source was shut down via its handle).
    fn next_chunk(
        &mut self,
    ) -> impl Future<Output = Result<Option<Bytes>, UpstreamError>> + Send;
}

/// Detached shutdown capability for a [`ByteSource`].
///
/// `shutdown` is idempotent: shutting down an already-closed source is a
/// no-op, so teardown paths never need to guard or suppress failures.
pub trait SourceHandle: Send + Sync {
    fn shutdown(&self);
}

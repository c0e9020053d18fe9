//! One-shot fallback metadata fetch
//!
//! A simplified, non-pooled retrieval used only after the pooled path has
//! failed once: open a fresh connection, take the first decoded metadata
//! block, disconnect.

use crate::protocol::FrameParser;
use crate::protocol::MetadataBlock;

use super::{ByteSource, SourceHandle, UpstreamConnector, UpstreamError};

/// Fetch the first metadata block from a fresh connection to `url`.
///
/// Fails with [`UpstreamError::NoMetadata`] if the origin declares no
/// metadata interval or the stream ends before a block arrives.
pub async fn fetch_first_metadata<C: UpstreamConnector>(
    connector: &C,
    url: &str,
) -> Result<MetadataBlock, UpstreamError> {
    let mut source = connector.connect(url).await?;

    let interval = source.meta_interval();
    if interval == 0 {
        source.handle().shutdown();
        return Err(UpstreamError::NoMetadata);
    }

    let handle = source.handle();
    let mut parser = FrameParser::new(interval);

    while let Some(chunk) = source.next_chunk().await? {
        if let Some(block) = parser.feed(&chunk).into_iter().next() {
            handle.shutdown();
            return Ok(block);
        }
    }

    Err(UpstreamError::NoMetadata)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;

    use super::*;

    /// Source that serves a fixed list of chunks, then EOF.
    struct ScriptedSource {
        meta_interval: usize,
        chunks: VecDeque<Bytes>,
        closed: Arc<AtomicBool>,
    }

    struct ScriptedHandle(Arc<AtomicBool>);

    impl SourceHandle for ScriptedHandle {
        fn shutdown(&self) {
            self.0.store(true, Ordering::Release);
        }
    }

    impl ByteSource for ScriptedSource {
        fn meta_interval(&self) -> usize {
            self.meta_interval
        }

        fn handle(&self) -> Box<dyn SourceHandle> {
            Box::new(ScriptedHandle(self.closed.clone()))
        }

        async fn next_chunk(&mut self) -> Result<Option<Bytes>, UpstreamError> {
            Ok(self.chunks.pop_front())
        }
    }

    struct ScriptedConnector {
        meta_interval: usize,
        chunks: Mutex<VecDeque<Bytes>>,
        closed: Arc<AtomicBool>,
    }

    impl UpstreamConnector for ScriptedConnector {
        type Source = ScriptedSource;

        async fn connect(&self, _url: &str) -> Result<ScriptedSource, UpstreamError> {
            Ok(ScriptedSource {
                meta_interval: self.meta_interval,
                chunks: std::mem::take(&mut self.chunks.lock().unwrap()),
                closed: self.closed.clone(),
            })
        }
    }

    fn icy_stream(interval: usize, meta: &str) -> Bytes {
        let mut bytes = vec![b'A'; interval];
        let units = meta.len().div_ceil(16);
        bytes.push(units as u8);
        bytes.extend_from_slice(meta.as_bytes());
        bytes.resize(interval + 1 + units * 16, 0);
        Bytes::from(bytes)
    }

    #[tokio::test]
    async fn test_first_block_returned_and_source_closed() {
        let closed = Arc::new(AtomicBool::new(false));
        let connector = ScriptedConnector {
            meta_interval: 8,
            chunks: Mutex::new(VecDeque::from([
                icy_stream(8, "StreamTitle='First';"),
                icy_stream(8, "StreamTitle='Second';"),
            ])),
            closed: closed.clone(),
        };

        let block = fetch_first_metadata(&connector, "http://example.com/stream")
            .await
            .unwrap();

        assert_eq!(block.stream_title(), Some("First"));
        assert!(closed.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_no_metadata_interval() {
        let connector = ScriptedConnector {
            meta_interval: 0,
            chunks: Mutex::new(VecDeque::new()),
            closed: Arc::new(AtomicBool::new(false)),
        };

        let result = fetch_first_metadata(&connector, "http://example.com/stream").await;

        assert!(matches!(result, Err(UpstreamError::NoMetadata)));
    }

    #[tokio::test]
    async fn test_end_before_metadata() {
        let connector = ScriptedConnector {
            meta_interval: 64,
            // Stream ends mid-audio, before any metadata point
            chunks: Mutex::new(VecDeque::from([Bytes::from_static(&[b'A'; 10])])),
            closed: Arc::new(AtomicBool::new(false)),
        };

        let result = fetch_first_metadata(&connector, "http://example.com/stream").await;

        assert!(matches!(result, Err(UpstreamError::NoMetadata)));
    }
}

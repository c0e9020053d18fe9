//! ICY frame parser
//!
//! De-interleaves metadata blocks from a raw ICY byte stream. The stream
//! alternates fixed-size audio runs with length-prefixed metadata blocks:
//!
//! ```text
//! ┌─────────────────┬─────┬──────────────────────┬─────────────────┬─────┐
//! │ interval bytes  │ len │ len * 16 bytes of    │ interval bytes  │ len │
//! │ of audio        │ byte│ NUL-padded metadata  │ of audio        │ ... │
//! └─────────────────┴─────┴──────────────────────┴─────────────────┴─────┘
//! ```
//!
//! A length byte of 0 means "no metadata this cycle". The parser is a pure
//! state machine: no I/O, state carried across arbitrarily-split chunks, so
//! blocks (and even the length byte itself) may straddle chunk boundaries.

use bytes::{BufMut, BytesMut};

use super::constants::META_LENGTH_UNIT;
use super::metadata::MetadataBlock;

/// Parser position within the interleave cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseState {
    /// Consuming audio payload; `remaining` bytes until the next length byte.
    Audio { remaining: usize },
    /// The audio run ended exactly at a chunk boundary; the length byte is
    /// the first byte of the next chunk. A distinct state rather than a
    /// numeric sentinel.
    AwaitingLength,
    /// Accumulating a metadata block split across chunks.
    Block { needed: usize, pending: BytesMut },
}

/// Incremental ICY metadata de-interleaver.
///
/// Feed raw upstream chunks in arrival order; complete blocks are returned
/// as they are decoded. With `interval == 0` the stream carries no metadata
/// and every chunk passes through untouched.
#[derive(Debug)]
pub struct FrameParser {
    interval: usize,
    state: ParseState,
}

impl FrameParser {
    /// Create a parser for a stream with the given `icy-metaint` value.
    pub fn new(interval: usize) -> Self {
        Self {
            interval,
            state: ParseState::Audio {
                remaining: interval,
            },
        }
    }

    /// The stream's declared metadata interval.
    pub fn interval(&self) -> usize {
        self.interval
    }

    /// Consume one chunk of upstream bytes, returning every metadata block
    /// completed within it, in stream order.
    ///
    /// Audio payload is discarded; this parser exists to extract metadata,
    /// not to forward audio. Never fails: undecodable block text is handled
    /// leniently by [`MetadataBlock`].
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<MetadataBlock> {
        if self.interval == 0 {
            return Vec::new();
        }

        let mut blocks = Vec::new();
        let mut offset = 0;

        while offset < chunk.len() {
            match &mut self.state {
                ParseState::Audio { remaining } => {
                    let take = (*remaining).min(chunk.len() - offset);
                    offset += take;
                    *remaining -= take;
                    if *remaining == 0 {
                        self.state = ParseState::AwaitingLength;
                    }
                }
                ParseState::AwaitingLength => {
                    let len = chunk[offset] as usize * META_LENGTH_UNIT;
                    offset += 1;
                    if len == 0 {
                        // Empty cycle: no event, counter restarts
                        self.state = ParseState::Audio {
                            remaining: self.interval,
                        };
                    } else {
                        self.state = ParseState::Block {
                            needed: len,
                            pending: BytesMut::with_capacity(len),
                        };
                    }
                }
                ParseState::Block { needed, pending } => {
                    let take = (*needed).min(chunk.len() - offset);
                    pending.put_slice(&chunk[offset..offset + take]);
                    offset += take;
                    *needed -= take;
                    if *needed == 0 {
                        blocks.push(MetadataBlock::from_bytes(pending));
                        self.state = ParseState::Audio {
                            remaining: self.interval,
                        };
                    }
                }
            }
        }

        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a stream: `interval` audio bytes, a length byte, the block text
    /// NUL-padded to a multiple of 16.
    fn interleave(interval: usize, meta: &str) -> Vec<u8> {
        let mut bytes = vec![b'A'; interval];
        let units = meta.len().div_ceil(META_LENGTH_UNIT);
        bytes.push(units as u8);
        bytes.extend_from_slice(meta.as_bytes());
        bytes.resize(interval + 1 + units * META_LENGTH_UNIT, 0);
        bytes
    }

    #[test]
    fn test_single_chunk() {
        let mut parser = FrameParser::new(8);
        let stream = interleave(8, "StreamTitle='Hi';");

        let blocks = parser.feed(&stream);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].stream_title(), Some("Hi"));
    }

    #[test]
    fn test_split_invariance() {
        let mut stream = interleave(8, "StreamTitle='First';");
        stream.extend_from_slice(&interleave(8, "StreamTitle='Second - Song';"));
        stream.extend_from_slice(&[b'B'; 5]);

        let mut whole = FrameParser::new(8);
        let expected = whole.feed(&stream);
        assert_eq!(expected.len(), 2);

        // Byte-at-a-time must produce the identical sequence
        let mut tiny = FrameParser::new(8);
        let mut got = Vec::new();
        for byte in &stream {
            got.extend(tiny.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(got, expected);

        // And so must every two-way split point
        for split in 0..stream.len() {
            let mut parser = FrameParser::new(8);
            let mut got = parser.feed(&stream[..split]);
            got.extend(parser.feed(&stream[split..]));
            assert_eq!(got, expected, "diverged at split {}", split);
        }
    }

    #[test]
    fn test_zero_interval_passthrough() {
        let mut parser = FrameParser::new(0);

        // Even bytes that look like metadata framing produce nothing
        let stream = interleave(8, "StreamTitle='Hi';");
        assert!(parser.feed(&stream).is_empty());
        assert!(parser.feed(&[0x01, 0xFF, 0x00]).is_empty());
    }

    #[test]
    fn test_zero_length_byte_resets_counter() {
        let mut parser = FrameParser::new(4);

        // Two cycles with length byte 0: no events
        assert!(parser.feed(&[b'A', b'A', b'A', b'A', 0x00]).is_empty());
        assert!(parser.feed(&[b'A', b'A', b'A', b'A', 0x00]).is_empty());

        // Counter was reset: a real block decodes at the expected offset
        let blocks = parser.feed(&interleave(4, "StreamTitle='x';"));
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_length_byte_deferred_across_chunks() {
        let mut parser = FrameParser::new(4);

        // Chunk ends exactly where the length byte would be
        assert!(parser.feed(&[b'A', b'A', b'A', b'A']).is_empty());

        // Next chunk starts with the length byte
        let mut rest = vec![0x01];
        rest.extend_from_slice(b"StreamTitle='Y';");
        let blocks = parser.feed(&rest);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].stream_title(), Some("Y"));
    }

    #[test]
    fn test_block_split_across_chunks() {
        let mut parser = FrameParser::new(2);
        let stream = interleave(2, "StreamTitle='Split Block';");

        assert!(parser.feed(&stream[..10]).is_empty());
        let blocks = parser.feed(&stream[10..]);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].stream_title(), Some("Split Block"));
    }

    #[test]
    fn test_metaint_8_walkthrough() {
        // 8 audio bytes, length byte 1, a 16-byte block, 8 more audio
        // bytes, then an empty cycle
        let mut parser = FrameParser::new(8);

        let mut stream = Vec::new();
        stream.extend_from_slice(b"AAAAAAAA");
        stream.push(0x01);
        stream.extend_from_slice(b"StreamTitle='Hi'");
        stream.extend_from_slice(b"AAAAAAAA");
        stream.push(0x00);

        let blocks = parser.feed(&stream);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].stream_title(), Some("Hi"));
        // Parser is mid-cycle again, ready for more audio
        assert_eq!(parser.interval(), 8);
        assert!(parser.feed(b"AA").is_empty());
    }

    #[test]
    fn test_invalid_utf8_block_does_not_panic() {
        let mut parser = FrameParser::new(1);

        let mut stream = vec![b'A', 0x01];
        stream.extend_from_slice(&[0xFF, 0xFE, b'x', b'=', b'y']);
        stream.resize(2 + 16, 0);

        let blocks = parser.feed(&stream);
        assert_eq!(blocks.len(), 1);
    }
}

//! ICY protocol constants
//!
//! The ICY convention (SHOUTcast/Icecast) interleaves textual metadata into
//! the audio byte stream at a fixed interval declared by the origin server.

/// Request header asking the origin to interleave metadata.
pub const ICY_METADATA_HEADER: &str = "Icy-MetaData";

/// Response header declaring the audio byte interval between metadata points.
pub const ICY_METAINT_HEADER: &str = "icy-metaint";

/// The length-prefix byte counts metadata length in units of 16 bytes.
pub const META_LENGTH_UNIT: usize = 16;

/// Maximum possible metadata block length (prefix byte 0xFF * 16).
pub const MAX_META_BLOCK_LEN: usize = 255 * META_LENGTH_UNIT;

/// Primary "now playing" field name inside a metadata block.
pub const STREAM_TITLE_FIELD: &str = "StreamTitle";

/// User-Agent sent on upstream requests.
pub const DEFAULT_USER_AGENT: &str = "icy-relay/0.2";

/// Default connect/read timeout for upstream requests, in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

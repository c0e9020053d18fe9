//! ICY wire protocol: constants, metadata decoding, and the frame parser
//! that de-interleaves metadata blocks from the raw byte stream.

pub mod constants;
pub mod frame;
pub mod metadata;

pub use frame::FrameParser;
pub use metadata::MetadataBlock;

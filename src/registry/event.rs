//! Events fanned out to pool subscribers

use crate::protocol::MetadataBlock;

/// An event pushed to every subscriber of a pool.
///
/// Cheap to clone; the metadata payload is the only variant carrying data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    /// A decoded "now playing" metadata block.
    Metadata(MetadataBlock),
    /// The upstream declared `icy-metaint: 0`; no metadata will ever arrive.
    NoMetadata,
    /// The upstream closed gracefully.
    End,
    /// The upstream failed, including after an exhausted fallback attempt.
    Error,
}

impl PoolEvent {
    /// Wire-level event name used by the push channel.
    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::Metadata(_) => "metadata",
            PoolEvent::NoMetadata => "nometadata",
            PoolEvent::End => "end",
            PoolEvent::Error => "error",
        }
    }
}

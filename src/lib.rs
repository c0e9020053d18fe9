//! # icy-relay
//!
//! A pooled ICY metadata relay. It connects to SHOUTcast/Icecast-style
//! audio streams, de-interleaves the in-band metadata blocks, and
//! republishes parsed "now playing" events to any number of SSE
//! subscribers — while keeping exactly one upstream connection per
//! distinct stream URL.
//!
//! ```text
//!   origin stream ──► [upstream pump] ──► FrameParser ──► PoolRegistry
//!                                                             │ fan-out
//!                                        ┌────────────────────┼─────────┐
//!                                        ▼                    ▼         ▼
//!                                   SSE session          SSE session   ...
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use icy_relay::{RelayServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> icy_relay::Result<()> {
//!     let server = RelayServer::new(ServerConfig::default())?;
//!     server.run().await
//! }
//! ```
//!
//! The parser ([`FrameParser`]) is a pure state machine usable on its own,
//! and the registry ([`PoolRegistry`]) is generic over its upstream
//! connector, so both can be driven by test doubles without a network.

pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod upstream;

pub use error::{RelayError, Result};
pub use protocol::{FrameParser, MetadataBlock};
pub use registry::{PoolEvent, PoolRegistry, RegistryConfig, RegistryError, SubscriberId};
pub use server::{RelayServer, ServerConfig};
pub use upstream::{HttpConnector, UpstreamConfig, UpstreamError};

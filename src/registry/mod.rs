//! Connection pool registry
//!
//! The registry keeps exactly one upstream connection per distinct stream
//! URL and fans decoded metadata out to every subscriber of that URL.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<PoolRegistry>
//!                  ┌────────────────────────────┐
//!                  │ pools: HashMap<StreamKey,  │
//!                  │   PoolShared {             │
//!                  │     parser: FrameParser,   │
//!                  │     subscribers,           │
//!                  │     upstream handle,       │
//!                  │   }                        │
//!                  │ >                          │
//!                  └──────────────┬─────────────┘
//!                                 │
//!          ┌──────────────────────┼──────────────────────┐
//!          │                      │                      │
//!          ▼                      ▼                      ▼
//!     [pump task]           [subscriber]           [subscriber]
//!     next_chunk()          sink.recv()            sink.recv()
//!          │                      │                      │
//!          └──► parser.feed() ──► fan_out() ──► SSE session
//! ```
//!
//! A pool is created lazily by the first subscriber and torn down the
//! moment its subscriber set empties or the upstream ends or errors
//! (after one optional fallback attempt). The registry is an explicit
//! instance, injected into the server rather than living in a global.

pub mod config;
pub mod error;
pub mod event;
pub mod pool;
pub mod store;

pub use config::RegistryConfig;
pub use error::RegistryError;
pub use event::PoolEvent;
pub use pool::{PoolState, PoolStats, SubscriberId};
pub use store::{EventSink, PoolRegistry};

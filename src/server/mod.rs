//! HTTP surface: SSE metadata subscriptions and the byte-range audio proxy.

pub mod config;
pub mod listener;
pub mod proxy;
pub mod session;

use std::sync::Arc;

use crate::registry::PoolRegistry;
use crate::upstream::HttpConnector;

pub use config::ServerConfig;
pub use listener::RelayServer;

/// The registry type the HTTP handlers talk to.
pub type SharedRegistry = Arc<PoolRegistry<HttpConnector>>;

/// State shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The pool registry behind `/api/meta`
    pub registry: SharedRegistry,
    /// Client used by the pass-through audio proxy
    pub proxy_client: reqwest::Client,
}

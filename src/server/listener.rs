//! Relay server
//!
//! Binds the HTTP listener and wires the registry into the route handlers.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use crate::error::{RelayError, Result};
use crate::registry::PoolRegistry;
use crate::upstream::HttpConnector;

use super::config::ServerConfig;
use super::{proxy, session, AppState, SharedRegistry};

/// ICY metadata relay server
pub struct RelayServer {
    config: ServerConfig,
    registry: SharedRegistry,
    proxy_client: reqwest::Client,
}

impl RelayServer {
    /// Build a server (and its pool registry) from the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let connector = HttpConnector::new(&config.upstream)?;
        let registry = Arc::new(PoolRegistry::with_config(
            connector,
            config.registry.clone(),
        ));
        let proxy_client = reqwest::Client::builder()
            .connect_timeout(config.upstream.connect_timeout)
            .build()
            .map_err(|e| RelayError::Io(std::io::Error::other(e)))?;

        Ok(Self {
            config,
            registry,
            proxy_client,
        })
    }

    /// Get a reference to the pool registry.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/api/meta", get(session::meta_events))
            .route(
                "/api/proxy",
                get(proxy::proxy_stream).options(proxy::preflight),
            )
            .with_state(AppState {
                registry: Arc::clone(&self.registry),
                proxy_client: self.proxy_client.clone(),
            })
    }

    /// Run the server. Blocks until the listener fails.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Relay server listening");

        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Run the server with graceful shutdown.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Relay server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Relay server stopped");
        Ok(())
    }

    /// The configured bind address.
    pub fn bind_addr(&self) -> std::net::SocketAddr {
        self.config.bind_addr
    }
}

//! Relay server binary
//!
//! Binds on `PORT` (default 3000) and serves `/api/meta` and `/api/proxy`
//! until interrupted.

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use icy_relay::{RelayServer, ServerConfig};

#[tokio::main]
async fn main() -> icy_relay::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let server = RelayServer::new(ServerConfig::with_addr(addr))?;
    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
}

//! Server configuration

use std::net::SocketAddr;

use crate::registry::RegistryConfig;
use crate::upstream::UpstreamConfig;

/// Relay server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Upstream request settings
    pub upstream: UpstreamConfig,

    /// Pool registry settings
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            upstream: UpstreamConfig::default(),
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a config with a custom bind address.
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address.
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Replace the upstream settings.
    pub fn upstream(mut self, upstream: UpstreamConfig) -> Self {
        self.upstream = upstream;
        self
    }

    /// Replace the registry settings.
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 3000);
        assert!(config.registry.fallback_enabled);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .upstream(UpstreamConfig::default().connect_timeout(Duration::from_secs(5)))
            .registry(RegistryConfig::default().disable_fallback());

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.upstream.connect_timeout, Duration::from_secs(5));
        assert!(!config.registry.fallback_enabled);
    }
}

//! Registry configuration

use std::time::Duration;

/// Pool registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long a subscriber to a metadata-less stream stays connected
    /// after receiving the `nometadata` event before being disconnected.
    pub no_metadata_linger: Duration,

    /// Whether a first upstream failure triggers the one-shot fallback
    /// fetch before the pool is declared dead.
    pub fallback_enabled: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            no_metadata_linger: Duration::from_millis(1100),
            fallback_enabled: true,
        }
    }
}

impl RegistryConfig {
    /// Set the no-metadata linger duration.
    pub fn no_metadata_linger(mut self, linger: Duration) -> Self {
        self.no_metadata_linger = linger;
        self
    }

    /// Disable the one-shot fallback fetch on upstream failure.
    pub fn disable_fallback(mut self) -> Self {
        self.fallback_enabled = false;
        self
    }
}

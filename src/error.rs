//! Crate-level error types

use crate::registry::RegistryError;
use crate::upstream::UpstreamError;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Top-level error type
#[derive(Debug)]
pub enum RelayError {
    /// I/O failure (bind, accept, serve)
    Io(std::io::Error),
    /// Upstream connection or transport failure
    Upstream(UpstreamError),
    /// Registry operation failure
    Registry(RegistryError),
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::Io(e) => write!(f, "I/O error: {}", e),
            RelayError::Upstream(e) => write!(f, "{}", e),
            RelayError::Registry(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::Io(e) => Some(e),
            RelayError::Upstream(e) => Some(e),
            RelayError::Registry(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(e: std::io::Error) -> Self {
        RelayError::Io(e)
    }
}

impl From<UpstreamError> for RelayError {
    fn from(e: UpstreamError) -> Self {
        RelayError::Upstream(e)
    }
}

impl From<RegistryError> for RelayError {
    fn from(e: RegistryError) -> Self {
        RelayError::Registry(e)
    }
}

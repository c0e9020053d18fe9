//! Registry error types

/// Error type for registry operations
#[derive(Debug, Clone)]
pub enum RegistryError {
    /// Subscription target is not an http(s) URL
    InvalidStreamUrl(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::InvalidStreamUrl(url) => {
                write!(f, "Invalid stream URL: {}", url)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

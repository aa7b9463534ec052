//! Error types for Fresca
//!
//! All modules use `FrescaResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Fresca operations
pub type FrescaResult<T> = Result<T, FrescaError>;

/// All errors that can occur in Fresca
#[derive(Error, Debug)]
pub enum FrescaError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid origin URL {url}: {reason}")]
    OriginInvalid { url: String, reason: String },

    // Storage and I/O errors
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode cache entry for {key}: {source}")]
    EntryEncode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No cache store exists for generation {0}")]
    UnknownGeneration(String),

    #[error("No cached response for {0}")]
    EntryNotFound(String),

    // Network errors
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    // Manifest errors
    #[error("Malformed manifest document: {0}")]
    ManifestParse(#[source] serde_json::Error),

    #[error("Manifest entry has an invalid reference {href}: {reason}")]
    ManifestEntry { href: String, reason: String },

    // Lifecycle errors
    #[error("Install failed for generation {generation}: {reason}")]
    Install { generation: String, reason: String },

    #[error("Invalid lifecycle transition: {0}")]
    InvalidTransition(String),

    // Serialization passthrough
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl FrescaError {
    /// Create an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a fetch error for a URL
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error leaves the caller with a retryable situation
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Install { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Fetch { .. } => Some("Check that the origin is reachable and try again"),
            Self::Install { .. } => Some("Re-run: fresca install"),
            Self::UnknownGeneration(_) => Some("Run: fresca list"),
            Self::InvalidTransition(_) => Some("Install must complete before activation"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FrescaError::UnknownGeneration("fresca-v0.1.0".to_string());
        assert!(err.to_string().contains("fresca-v0.1.0"));
    }

    #[test]
    fn error_hint() {
        let err = FrescaError::fetch("https://example.io/a", "connection refused");
        assert_eq!(
            err.hint(),
            Some("Check that the origin is reachable and try again")
        );
    }

    #[test]
    fn error_retryable() {
        assert!(FrescaError::fetch("https://example.io/a", "timeout").is_retryable());
        assert!(!FrescaError::InvalidTransition("already serving".into()).is_retryable());
    }
}

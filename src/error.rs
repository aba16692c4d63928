//! Error types for wheelmirror
//!
//! All modules use `MirrorResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for wheelmirror operations
pub type MirrorResult<T> = Result<T, MirrorError>;

/// All errors that can occur while mirroring
#[derive(Error, Debug)]
pub enum MirrorError {
    // Resolution errors
    #[error("Package not found: {filename}")]
    ResolverMiss { package: String, filename: String },

    #[error("Metadata not found: {filename}")]
    MetadataMiss { package: String, filename: String },

    #[error("Invalid name in request path: {0:?}")]
    InvalidName(String),

    // Origin errors
    #[error("Origin request failed for {url}: {reason}")]
    OriginUnavailable { url: String, reason: String },

    #[error("Origin returned HTTP {status} for {url}")]
    OriginStatus { url: String, status: u16 },

    // Archive errors
    #[error("Archive {path} could not be unpacked: {reason}")]
    ArchiveCorrupt { path: PathBuf, reason: String },

    #[error("Failed to write archive {path}: {reason}")]
    ArchiveWrite { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MirrorError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an origin transport error
    pub fn origin(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::OriginUnavailable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error means the requested resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ResolverMiss { .. } | Self::MetadataMiss { .. })
    }

    /// Whether the error was caused by the origin registry
    pub fn is_origin(&self) -> bool {
        matches!(
            self,
            Self::OriginUnavailable { .. } | Self::OriginStatus { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => Some("Run: wheelmirror config init --force"),
            Self::ConfigDirCreate { .. } => Some("Pass --config with a writable path"),
            _ => None,
        }
    }
}

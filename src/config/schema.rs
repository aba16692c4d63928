//! Configuration schema for wheelmirror
//!
//! Configuration is stored at `~/.config/wheelmirror/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP listener settings
    pub server: ServerConfig,

    /// Upstream registry settings
    pub origin: OriginConfig,

    /// On-disk artifact stores
    pub storage: StorageConfig,

    /// Wheel patching rules
    pub transform: TransformConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable audit logging
    pub audit_log: bool,

    /// Append logs to this file instead of stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            audit_log: true,
            log_file: None,
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Origin registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Simple index root, without trailing slash
    pub index_url: String,

    /// Overall timeout per origin request in seconds (unset = no timeout)
    pub timeout_secs: Option<u64>,

    /// User-Agent sent to the origin
    pub user_agent: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            index_url: "https://pypi.org/simple".to_string(),
            timeout_secs: None,
            user_agent: format!("wheelmirror/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Artifact store locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Verbatim copies of origin artifacts
    pub cache_dir: PathBuf,

    /// Patched wheels and no-op markers
    pub modified_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wheelmirror");
        Self {
            cache_dir: base.join("cache"),
            modified_dir: base.join("modified"),
        }
    }
}

/// Wheel patching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Package names whose wheels get patched
    pub packages: Vec<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            packages: vec!["requests".to_string()],
        }
    }
}

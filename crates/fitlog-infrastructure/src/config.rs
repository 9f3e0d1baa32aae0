//! Application configuration.
//!
//! Loads `~/.config/fitlog/config.toml`; a missing or unreadable file
//! yields the defaults so the client works out of the box.

use crate::paths::FitlogPaths;
use fitlog_core::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Remote log service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the remote log service.
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Local progress-cache settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Override for the cache base directory; the platform data
    /// directory is used when unset.
    pub dir: Option<PathBuf>,
}

/// Root configuration for the fitlog client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FitlogConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
}

impl FitlogConfig {
    /// Loads the configuration from the default location, falling
    /// back to defaults when the file is missing or invalid.
    pub fn load() -> Self {
        match FitlogPaths::config_file() {
            Ok(path) => Self::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!("[FitlogConfig] falling back to defaults: {e}");
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("[FitlogConfig] falling back to defaults: {e}");
                Self::default()
            }
        }
    }

    /// Loads the configuration from an explicit path. A missing file
    /// yields the defaults; a present-but-invalid file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(toml::from_str(&text)?)
    }
}

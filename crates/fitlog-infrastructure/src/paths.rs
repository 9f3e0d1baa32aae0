//! Unified path management for fitlog local files.
//!
//! This ensures consistency across all platforms (Linux, macOS,
//! Windows).
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/fitlog/            # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/fitlog/       # Data directory
//! └── progress/                # Durable progress cache entries
//! ```

use fitlog_core::error::{FitlogError, Result};
use std::path::PathBuf;

/// Unified path management for fitlog.
pub struct FitlogPaths;

impl FitlogPaths {
    /// Returns the fitlog configuration directory.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("fitlog"))
            .ok_or_else(|| FitlogError::Config("cannot find config directory".to_string()))
    }

    /// Returns the fitlog data directory, used for the progress cache.
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("fitlog"))
            .ok_or_else(|| FitlogError::Config("cannot find data directory".to_string()))
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the directory holding progress-cache entries.
    pub fn progress_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("progress"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_is_under_config_dir() {
        let config_file = FitlogPaths::config_file().unwrap();
        assert!(config_file.ends_with("config.toml"));
        let config_dir = FitlogPaths::config_dir().unwrap();
        assert!(config_file.starts_with(&config_dir));
    }

    #[test]
    fn test_progress_dir_is_under_data_dir() {
        let progress_dir = FitlogPaths::progress_dir().unwrap();
        assert!(progress_dir.ends_with("progress"));
        let data_dir = FitlogPaths::data_dir().unwrap();
        assert!(progress_dir.starts_with(&data_dir));
    }
}

//! Path management for redpersona configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/redpersona/        # Config directory (platform specific)
//! ├── config.toml              # Pipeline, fetch and output settings
//! ├── secret.json              # API keys
//! └── logs/                    # Daily rolling log files
//!     └── redpersona.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

const APP_NAME: &str = "redpersona";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves where redpersona keeps its files.
pub struct PersonaPaths;

impl PersonaPaths {
    /// `~/.config/redpersona` on Linux, the platform equivalent elsewhere.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Path to `secret.json`. Keep it readable by the owner only.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }

    pub fn log_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs"))
    }
}

//! `config.toml` storage.

use std::fs;
use std::path::{Path, PathBuf};

use redpersona_core::PersonaError;
use redpersona_core::config::ConfigRoot;

use super::atomic::write_atomic;
use crate::paths::PersonaPaths;

/// Errors that can occur during config storage operations.
#[derive(Debug)]
pub enum ConfigStorageError {
    /// File I/O error.
    IoError(std::io::Error),
    /// TOML parsing error.
    TomlParseError(toml::de::Error),
    /// TOML serialization error.
    TomlSerError(toml::ser::Error),
    /// Config directory not found.
    ConfigDirNotFound,
}

impl std::fmt::Display for ConfigStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigStorageError::TomlParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigStorageError::TomlSerError(e) => write!(f, "TOML serialization error: {}", e),
            ConfigStorageError::ConfigDirNotFound => {
                write!(f, "Could not determine config directory")
            }
        }
    }
}

impl std::error::Error for ConfigStorageError {}

impl From<std::io::Error> for ConfigStorageError {
    fn from(e: std::io::Error) -> Self {
        ConfigStorageError::IoError(e)
    }
}

impl From<toml::de::Error> for ConfigStorageError {
    fn from(e: toml::de::Error) -> Self {
        ConfigStorageError::TomlParseError(e)
    }
}

impl From<toml::ser::Error> for ConfigStorageError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigStorageError::TomlSerError(e)
    }
}

impl From<ConfigStorageError> for PersonaError {
    fn from(e: ConfigStorageError) -> Self {
        PersonaError::config(e.to_string())
    }
}

/// Loads and saves `config.toml`.
///
/// A missing or empty file is not an error: every section has defaults.
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Creates a handle for the default config file.
    pub fn new() -> Result<Self, ConfigStorageError> {
        let path = PersonaPaths::config_file().map_err(|_| ConfigStorageError::ConfigDirNotFound)?;
        Ok(Self { path })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<ConfigRoot, ConfigStorageError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(ConfigRoot::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ConfigRoot::default());
        }

        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, config: &ConfigRoot) -> Result<(), ConfigStorageError> {
        let content = toml::to_string_pretty(config)?;
        write_atomic(&self.path, content.as_bytes())?;
        Ok(())
    }

    /// Writes the default configuration unless a file already exists.
    ///
    /// Returns `true` when a file was created.
    pub fn ensure_exists(&self) -> Result<bool, ConfigStorageError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&ConfigRoot::default())?;
        tracing::info!(path = %self.path.display(), "Created default config file");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redpersona_core::config::CitationFallback;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::with_path(temp_dir.path().join("config.toml"));

        assert_eq!(storage.load().unwrap(), ConfigRoot::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::with_path(temp_dir.path().join("config.toml"));
        let mut config = ConfigRoot::default();
        config.pipeline.max_retries = 5;
        config.pipeline.citation_fallback = CitationFallback::CiteNothing;

        storage.save(&config).unwrap();

        assert_eq!(storage.load().unwrap(), config);
    }

    #[test]
    fn test_ensure_exists_only_once() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::with_path(temp_dir.path().join("config.toml"));

        assert!(storage.ensure_exists().unwrap());
        assert!(!storage.ensure_exists().unwrap());
        assert_eq!(storage.load().unwrap(), ConfigRoot::default());
    }

    #[test]
    fn test_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[pipeline\nmax_retries = ").unwrap();

        let result = ConfigStorage::with_path(path).load();

        assert!(matches!(result, Err(ConfigStorageError::TomlParseError(_))));
    }
}

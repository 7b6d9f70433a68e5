//! Configuration loader

use std::path::Path;

use squeeze_utils::{config_file, Result, SqueezeError};

use super::{AppConfig, DEFAULT_CONFIG_TOML};

/// Upper bound on `server.workers`
pub const MAX_WORKERS: usize = 1024;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the default location
    ///
    /// Falls back to the embedded defaults when no file exists.
    pub fn load() -> Result<AppConfig> {
        let path = config_file();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Self::parse(DEFAULT_CONFIG_TOML, Path::new("<built-in defaults>"))
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| SqueezeError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration from string
    pub fn parse(content: &str, path: &Path) -> Result<AppConfig> {
        toml::from_str(content).map_err(|e| SqueezeError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Validate configuration
    pub fn validate(config: &AppConfig) -> Result<()> {
        if config.server.workers > MAX_WORKERS {
            return Err(SqueezeError::config(format!(
                "workers must be at most {}",
                MAX_WORKERS
            )));
        }

        if config.server.io_timeout_secs == 0 {
            return Err(SqueezeError::config("io_timeout_secs must be at least 1"));
        }

        if config.server.bind.trim().is_empty() {
            return Err(SqueezeError::config("bind address must not be empty"));
        }

        if config.storage.compressed_dir.as_os_str().is_empty()
            || config.storage.decompressed_dir.as_os_str().is_empty()
        {
            return Err(SqueezeError::config("storage directories must not be empty"));
        }

        Ok(())
    }
}

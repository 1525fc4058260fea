//! Configuration loading and management
//!
//! Handles parsing of `taskpad.toml` configuration files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration file name looked up in the working directory
pub const CONFIG_FILE: &str = "taskpad.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// View-history configuration
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Snapshot store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory snapshots are written to
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".taskpad")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// View-history configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Bound on the number of history entries; unbounded when absent
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl Config {
    /// Load configuration from a `taskpad.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.history.capacity == Some(0) {
            return Err(Error::InvalidConfig(
                "history.capacity must be >= 1".to_string(),
            ));
        }
        if self.store.data_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "store.data_dir cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

//! Persistent settings: where the game lives and where caches go
//!
//! The game directory is stored per operating system so one config file can
//! be shared between machines that mount the same installation differently.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stored settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for cached index snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Game directory keyed by `std::env::consts::OS`
    #[serde(default)]
    pub game_dirs: BTreeMap<String, PathBuf>,
}

impl StorageConfig {
    /// Game directory for the running operating system
    pub fn game_dir(&self) -> Option<&Path> {
        self.game_dirs.get(std::env::consts::OS).map(PathBuf::as_path)
    }

    /// Remember `dir` as the game directory for the running operating system
    pub fn set_game_dir(&mut self, dir: impl Into<PathBuf>) {
        self.game_dirs
            .insert(std::env::consts::OS.to_string(), dir.into());
    }

    /// Configured cache directory, or the platform default
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }
}

/// `<config dir>/sqpack/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sqpack")
        .join("config.toml")
}

/// `<cache dir>/sqpack/indexes`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sqpack")
        .join("indexes")
}

/// Settings bound to the file they were loaded from
pub struct ConfigManager {
    config_path: PathBuf,
    config: StorageConfig,
}

impl ConfigManager {
    /// Load from the default location
    pub fn new() -> Result<Self> {
        Self::with_path(default_config_path())
    }

    /// Load from `config_path`; a missing file yields default settings
    pub fn with_path(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        let config = Self::load_config(&config_path)?;
        Ok(Self {
            config_path,
            config,
        })
    }

    fn load_config(config_path: &Path) -> Result<StorageConfig> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            debug!("No config at {:?}, using defaults", config_path);
            Ok(StorageConfig::default())
        }
    }

    /// Write the current settings back, creating parent directories
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_content = toml::to_string_pretty(&self.config)?;
        fs::write(&self.config_path, toml_content)?;
        Ok(())
    }

    /// File the settings are bound to
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Current settings
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Mutable access to the settings; call [`save`](Self::save) to persist
    pub fn config_mut(&mut self) -> &mut StorageConfig {
        &mut self.config
    }
}

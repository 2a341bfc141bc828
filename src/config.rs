use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::filter::DiscoveryFilter;
use crate::history::DEFAULT_LIMIT;

const APP_DIR_NAME: &str = "lakeview";

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the main configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/lakeview or ~/.config/lakeview
    /// - macOS: ~/Library/Application Support/lakeview
    /// - Windows: %APPDATA%\lakeview
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join(APP_DIR_NAME))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join(APP_DIR_NAME))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home
                .join("Library")
                .join("Application Support")
                .join(APP_DIR_NAME))
        }

        #[cfg(target_os = "windows")]
        {
            Ok(dirs::config_dir()
                .context("Failed to get Windows config directory")?
                .join(APP_DIR_NAME))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(".lakeview"))
        }
    }

    /// Get the settings file path (config.toml)
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;
        Ok(config_dir)
    }
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

fn default_use_checkpoints() -> bool {
    true
}

/// Persistent settings applied when the command line leaves them unset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LakeviewConfig {
    /// Versions shown per table by `history`
    #[serde(default = "default_limit")]
    pub default_limit: i64,

    /// Worker threads for reading tables (unset: one per CPU)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Start from a checkpoint when older commits have been cleaned up
    #[serde(default = "default_use_checkpoints")]
    pub use_checkpoints: bool,

    #[serde(default)]
    pub discovery: DiscoveryFilter,
}

impl Default for LakeviewConfig {
    fn default() -> Self {
        LakeviewConfig {
            default_limit: default_limit(),
            workers: None,
            use_checkpoints: default_use_checkpoints(),
            discovery: DiscoveryFilter::default(),
        }
    }
}

impl LakeviewConfig {
    /// Load configuration from file, or defaults when there is none
    pub fn load() -> Result<Self> {
        let config_path = ConfigManager::config_file_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: LakeviewConfig =
            toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        ConfigManager::ensure_config_dir()?;
        let config_path = ConfigManager::config_file_path()?;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_limit <= 0 {
            anyhow::bail!(
                "default_limit must be a positive integer, got {}",
                self.default_limit
            );
        }
        if self.workers == Some(0) {
            anyhow::bail!("workers must be a positive integer");
        }
        self.discovery
            .validate()
            .context("Invalid discovery exclude pattern")?;
        Ok(())
    }
}

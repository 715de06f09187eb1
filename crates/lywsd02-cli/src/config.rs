//! Configuration file management.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration file structure, stored as TOML under the platform config
/// directory (`lywsd02/config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default device identifier (advertised name or address).
    #[serde(default)]
    pub device: Option<String>,

    /// Default scan timeout in seconds.
    #[serde(default)]
    pub scan_timeout: Option<u64>,
}

impl Config {
    /// Path of the config file, if a platform config directory exists.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lywsd02").join("config.toml"))
    }

    /// Load the config, returning defaults when no file exists yet.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Write the config to disk, creating the directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::path().context("no config directory available on this platform")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize_from_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.device.is_none());
        assert!(config.scan_timeout.is_none());
    }

    #[test]
    fn test_roundtrip() {
        let config = Config {
            device: Some("LYWSD02".to_string()),
            scan_timeout: Some(12),
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.device.as_deref(), Some("LYWSD02"));
        assert_eq!(back.scan_timeout, Some(12));
    }
}

//! Application configuration management.
//!
//! Persistent defaults that would be tedious to repeat on every run:
//! the cache database location and always-ignored patterns. Stored as
//! JSON in the platform config directory; a missing or unreadable file
//! silently falls back to defaults.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Fingerprint cache database path; `None` uses the platform
    /// cache directory.
    #[serde(default)]
    pub cache_db: Option<PathBuf>,

    /// Ignore patterns applied to every scan, before any `--ignore`
    /// flags.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    pub fn load() -> Self {
        match Self::load_internal() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn load_internal() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the configuration to the default platform-specific path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join("config.json"))
    }

    /// Default on-disk location for the fingerprint cache database.
    pub fn default_cache_db() -> Result<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.cache_dir().join("fingerprints.db"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "backscan", "backscan")
        .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.cache_db.is_none());
        assert!(config.ignore_patterns.is_empty());
    }

    #[test]
    fn test_config_round_trip_through_json() {
        let config = Config {
            cache_db: Some(PathBuf::from("/var/cache/backscan.db")),
            ignore_patterns: vec!["*.tmp".to_string()],
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.cache_db, config.cache_db);
        assert_eq!(parsed.ignore_patterns, config.ignore_patterns);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = serde_json::from_str("{}").unwrap();
        assert!(parsed.cache_db.is_none());
        assert!(parsed.ignore_patterns.is_empty());
    }
}

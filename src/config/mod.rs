//! Configuration management
//!
//! Settings live in `~/.playtrack/config.json`. Missing file or fields
//! fall back to defaults so a fresh install works without any setup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How often the reconciler polls the process list, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between reconciliation passes
    pub poll_interval_secs: u64,

    /// Database location override; defaults to ~/.playtrack/playtrack.db
    pub db_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            db_path: None,
        }
    }
}

impl Config {
    /// Loads the config file, or defaults when it does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {path:?}"))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config at {path:?}"))?;
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?
            .join(".playtrack");

        Ok(config_dir.join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_poll_interval() {
        let config = Config::default();
        assert_eq!(config.poll_interval_secs, 5);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str("{\"poll_interval_secs\": 10}").unwrap();
        assert_eq!(config.poll_interval_secs, 10);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_empty_object_is_all_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
    }
}

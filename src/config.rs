//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which covers the portal API base URL and the last signed-in email.
//!
//! Configuration is stored at `~/.config/bluelight/config.json`; the
//! credential record lives separately under the local data directory.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/state directory paths
const APP_NAME: &str = "bluelight";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Portal API base URL. The environment wins over the config file so
    /// a deployment can be switched without editing state.
    pub fn api_base(&self) -> Option<String> {
        std::env::var("BLUELIGHT_API_BASE")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.api_base_url.clone())
    }

    /// Directory holding the persisted credential record. `None` when the
    /// platform offers no local data directory; the store then runs
    /// without persistence.
    pub fn state_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join(APP_NAME))
    }
}

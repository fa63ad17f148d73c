//! Application configuration management.
//!
//! Holds the backend base URL, image host account, and the remembered login
//! email. Stored at `~/.config/husmah-admin/config.json`; the session file
//! lives in the cache directory.
//!
//! Environment variables override the file:
//! - `HUSMAH_API_BASE_URL`: backend base URL
//! - `HUSMAH_CLOUD_NAME`: image host cloud name

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "husmah-admin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001";

pub const DEFAULT_CLOUD_NAME: &str = "ddptresnb";

pub const API_BASE_URL_ENV: &str = "HUSMAH_API_BASE_URL";

pub const CLOUD_NAME_ENV: &str = "HUSMAH_CLOUD_NAME";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub cloud_name: Option<String>,
    #[serde(default)]
    pub last_email: Option<String>,
    #[serde(default)]
    pub remember_me: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn session_path(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join(SESSION_FILE))
    }

    /// Backend base URL without a trailing slash
    pub fn api_base_url(&self) -> String {
        resolve(API_BASE_URL_ENV, self.api_base_url.as_deref(), DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn cloud_name(&self) -> String {
        resolve(CLOUD_NAME_ENV, self.cloud_name.as_deref(), DEFAULT_CLOUD_NAME)
    }
}

/// Environment first, then the config file, then the default. Blank values
/// are skipped.
fn resolve(env_key: &str, configured: Option<&str>, default: &str) -> String {
    std::env::var(env_key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| {
            configured
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| default.to_string())
}

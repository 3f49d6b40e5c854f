//! Application configuration management.
//!
//! This module handles loading and saving the library configuration: the
//! catalog API base URL, request timeout, cache TTL, page size and an
//! optional storage directory override.
//!
//! Configuration is stored at `~/.config/studyguide/config.json`. The
//! `STUDYGUIDE_API_URL` environment variable (a `.env` file is honored)
//! overrides the base URL.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Application name used for config/storage directory paths
const APP_NAME: &str = "studyguide";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `api_base_url`
const API_URL_ENV: &str = "STUDYGUIDE_API_URL";

/// Default API host when nothing is configured (local development server)
const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// Bounded fetch time. A timed-out fetch falls back to cached data.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Catalog content changes slowly; a day keeps the app snappy offline.
const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub cache_ttl_hours: i64,
    pub page_size: u32,
    /// Overrides the platform data directory for persistent storage
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
            page_size: DEFAULT_PAGE_SIZE,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        // Load .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            debug!(path = %path.display(), "Config loaded");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the persistent key-value store
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Cache lifetime. Negative or out-of-range values fall back to the default.
    pub fn cache_ttl(&self) -> chrono::Duration {
        match chrono::Duration::try_hours(self.cache_ttl_hours) {
            Some(ttl) if self.cache_ttl_hours >= 0 => ttl,
            _ => {
                warn!(
                    cache_ttl_hours = self.cache_ttl_hours,
                    default = DEFAULT_CACHE_TTL_HOURS,
                    "Invalid cache TTL, using default"
                );
                chrono::Duration::hours(DEFAULT_CACHE_TTL_HOURS)
            }
        }
    }
}

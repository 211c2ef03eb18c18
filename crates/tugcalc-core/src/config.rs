//! Application configuration management.
//!
//! This module handles loading the application configuration:
//! where the shell is served from, which cache version is current, and the
//! dataset path.
//!
//! Configuration is stored at `~/.config/tugcalc/config.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;

use crate::offline::ShellConfig;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "tugcalc";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Cache version used when none is configured.
/// Bump on every deploy of the shell so old generations are dropped.
pub const DEFAULT_CACHE_VERSION: &str = "v6";

/// Environment variable overriding `base_url`
pub const ENV_BASE_URL: &str = "TUGCALC_BASE_URL";

/// Environment variable overriding `cache_version`
pub const ENV_CACHE_VERSION: &str = "TUGCALC_CACHE_VERSION";

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub base_url: Option<String>,
    pub cache_version: Option<String>,
    pub dataset_path: Option<String>,
    pub assets: Option<Vec<String>>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Ok(serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `TUGCALC_*` environment overrides.
    pub fn apply_env(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_BASE_URL).ok(),
            std::env::var(ENV_CACHE_VERSION).ok(),
        )
    }

    pub fn with_overrides(mut self, base_url: Option<String>, cache_version: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|s| !s.trim().is_empty()) {
            self.base_url = Some(url);
        }
        if let Some(version) = cache_version.filter(|s| !s.trim().is_empty()) {
            self.cache_version = Some(version);
        }
        self
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

    /// The shell's base URL. Always ends with `/` so relative asset paths
    /// resolve beneath it.
    pub fn scope_url(&self) -> Result<Url> {
        let raw = self.base_url.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "No base URL configured. Set {} or base_url in config.json",
                ENV_BASE_URL
            )
        })?;
        let raw = raw.trim();
        let with_slash = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{}/", raw)
        };
        Url::parse(&with_slash).with_context(|| format!("Invalid base URL: {}", raw))
    }

    pub fn cache_version(&self) -> &str {
        self.cache_version
            .as_deref()
            .unwrap_or(DEFAULT_CACHE_VERSION)
    }

    pub fn shell_config(&self) -> Result<ShellConfig> {
        let mut shell = ShellConfig::new(self.scope_url()?, self.cache_version());
        if let Some(ref path) = self.dataset_path {
            shell.dataset_path = path.clone();
        }
        if let Some(ref assets) = self.assets {
            shell.assets = assets.clone();
        }
        Ok(shell)
    }
}

// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::DEFAULT_API_URL;
use crate::models::normalize_code;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Json,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub storage: StorageKind,
    pub storage_path: String,
    pub default_from: String,
    pub default_to: String,
    pub refresh_on_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage: StorageKind::Json,
            storage_path: "cache/rates.json".to_string(),
            default_from: "USD".to_string(),
            default_to: "EUR".to_string(),
            refresh_on_start: false,
        }
    }
}

impl Config {
    /// Replace the default currency pair. Blank codes leave the current value.
    pub fn set_defaults(&mut self, from: Option<&str>, to: Option<&str>) {
        if let Some(code) = from.and_then(normalize_code) {
            self.default_from = code;
        }
        if let Some(code) = to.and_then(normalize_code) {
            self.default_to = code;
        }
    }

    /// Apply `RATES_API_URL` and `RATES_STORAGE_PATH` if set
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("RATES_API_URL") {
            if !url.trim().is_empty() {
                self.api_url = url;
            }
        }
        if let Ok(path) = env::var("RATES_STORAGE_PATH") {
            if !path.trim().is_empty() {
                self.storage_path = path;
            }
        }
    }
}

pub fn get_config_path() -> PathBuf {
    match env::var("RATES_CONFIG") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from("config.toml"),
    }
}

/// Load the config file, falling back to defaults when it does not exist,
/// then apply environment overrides.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = load_config_from(&get_config_path())?;
    config.apply_env_overrides();
    Ok(config)
}

pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config = toml::from_str(&config_str)
        .with_context(|| format!("Invalid config in {}", path.display()))?;
    Ok(config)
}

pub fn save_config(config: &Config, path: &Path) -> anyhow::Result<()> {
    let config_str = toml::to_string_pretty(config)?;
    fs::write(path, config_str)?;
    Ok(())
}

//! Configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 arrive together as [`ConfigOverrides`] (clap reads both).

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application folder name under the platform config/data directories
pub const APP_DIR_NAME: &str = "recipe-vault";

/// Optional settings read from `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub database: Option<PathBuf>,
    pub allow_origin: Option<String>,
    pub log_level: Option<String>,
    pub scrape_timeout_secs: Option<u64>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub database: Option<PathBuf>,
    pub allow_origin: Option<String>,
    pub log_level: Option<String>,
    pub scrape_timeout_secs: Option<u64>,
}

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub port: u16,
    pub bind: String,
    pub database: PathBuf,
    pub allow_origin: String,
    pub log_level: String,
    pub scrape_timeout_secs: u64,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            port: 4000,
            bind: "127.0.0.1".to_string(),
            database: default_data_dir().join("recipes.db"),
            allow_origin: "*".to_string(),
            log_level: "info".to_string(),
            scrape_timeout_secs: 20,
        }
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub port: u16,
    pub bind: String,
    pub database_path: PathBuf,
    /// `*` allows any origin
    pub allow_origin: String,
    pub log_level: String,
    pub scrape_timeout: Duration,
}

impl ServiceConfig {
    /// Merge the tiers, highest priority first
    pub fn resolve(overrides: ConfigOverrides, file: Option<TomlConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = CompiledDefaults::for_current_platform();

        Self {
            port: overrides.port.or(file.port).unwrap_or(defaults.port),
            bind: overrides.bind.or(file.bind).unwrap_or(defaults.bind),
            database_path: overrides
                .database
                .or(file.database)
                .unwrap_or(defaults.database),
            allow_origin: overrides
                .allow_origin
                .or(file.allow_origin)
                .unwrap_or(defaults.allow_origin),
            log_level: overrides
                .log_level
                .or(file.log_level)
                .unwrap_or(defaults.log_level),
            scrape_timeout: Duration::from_secs(
                overrides
                    .scrape_timeout_secs
                    .or(file.scrape_timeout_secs)
                    .unwrap_or(defaults.scrape_timeout_secs),
            ),
        }
    }

    /// `host:port` string for binding the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Default config file location (`~/.config/recipe-vault/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Read a TOML config file.
///
/// A missing file is not an error (`Ok(None)`); unreadable or malformed
/// files are.
pub fn load_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))?;

    Ok(Some(config))
}

/// Get OS-dependent default data folder
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./recipe_vault_data"))
}

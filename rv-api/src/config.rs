//! Command-line arguments
//!
//! clap reads each flag from the command line or its `RV_*` environment
//! variable; the result feeds the tiered resolution in `rv_common::config`.

use clap::Parser;
use rv_common::config::{default_config_path, ConfigOverrides};
use std::path::PathBuf;

/// Command-line arguments for rv-api
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rv-api")]
#[command(about = "Recipe Vault API service")]
#[command(version)]
pub struct Args {
    /// HTTP port
    #[arg(short, long, env = "RV_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "RV_BIND")]
    pub bind: Option<String>,

    /// Path to the SQLite database file
    #[arg(short, long, env = "RV_DATABASE")]
    pub database: Option<PathBuf>,

    /// Allowed CORS origin (`*` for any)
    #[arg(long, env = "RV_ALLOW_ORIGIN")]
    pub allow_origin: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "RV_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Timeout for fetching recipe pages, in seconds
    #[arg(long, env = "RV_SCRAPE_TIMEOUT_SECS")]
    pub scrape_timeout_secs: Option<u64>,

    /// Path to a TOML config file
    #[arg(short, long, env = "RV_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port,
            bind: self.bind.clone(),
            database: self.database.clone(),
            allow_origin: self.allow_origin.clone(),
            log_level: self.log_level.clone(),
            scrape_timeout_secs: self.scrape_timeout_secs,
        }
    }

    /// Explicit `--config` path, else the platform default
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(default_config_path)
    }
}

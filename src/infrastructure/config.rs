//! Configuration infrastructure
//!
//! A single JSON document holds scraping, retry, output and logging settings.
//! `ConfigManager` creates it with defaults on first run, and a file that no longer
//! parses is backed up and reset instead of aborting the run. Command-line flags are
//! applied on top of whatever was loaded.

#![allow(clippy::uninlined_format_args)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

pub use crate::infrastructure::retry_policy::RetryPolicy;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scrape: ScrapeConfig,
    pub retry: RetryPolicy,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Request identity, politeness and filtering defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub request_timeout_seconds: u64,

    /// Base delay after each listing page fetch
    pub listing_delay_seconds: f64,

    /// Base delay after each detail page fetch
    pub detail_delay_seconds: f64,

    /// Upper bound of the uniform jitter added to both delays
    pub delay_jitter_seconds: f64,

    pub min_duration_minutes: u32,

    /// Label manifest, relative to the working directory unless absolute
    pub labels_file: PathBuf,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            accept_language: defaults::ACCEPT_LANGUAGE.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            listing_delay_seconds: defaults::LISTING_DELAY_SECONDS,
            detail_delay_seconds: defaults::DETAIL_DELAY_SECONDS,
            delay_jitter_seconds: defaults::DELAY_JITTER_SECONDS,
            min_duration_minutes: defaults::MIN_DURATION_MINUTES,
            labels_file: PathBuf::from(defaults::LABELS_FILE),
        }
    }
}

/// Where results land
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
    pub links_file: String,
    pub table_file: String,
    pub rejected_by_genre_file: String,
    pub missing_date_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(defaults::OUTPUT_DIR),
            links_file: defaults::LINKS_FILE.to_string(),
            table_file: defaults::TABLE_FILE.to_string(),
            rejected_by_genre_file: defaults::REJECTED_BY_GENRE_FILE.to_string(),
            missing_date_file: defaults::MISSING_DATE_FILE.to_string(),
        }
    }
}

impl OutputConfig {
    pub fn links_path(&self) -> PathBuf {
        self.output_dir.join(&self.links_file)
    }

    pub fn table_path(&self) -> PathBuf {
        self.output_dir.join(&self.table_file)
    }

    pub fn rejected_by_genre_path(&self) -> PathBuf {
        self.output_dir.join(&self.rejected_by_genre_file)
    }

    pub fn missing_date_path(&self) -> PathBuf {
        self.output_dir.join(&self.missing_date_file)
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    pub console_output: bool,
    pub file_output: bool,

    /// Log directory; `logs/` under the platform data directory when unset
    pub log_dir: Option<PathBuf>,

    /// Extra per-target levels (e.g., "reqwest": "debug")
    pub module_filters: HashMap<String, String>,

    /// Phase progress bars on stderr
    pub progress_bars: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            module_filters: HashMap::new(),
            progress_bars: defaults::LOG_PROGRESS_BARS,
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);
        Ok(config_dir)
    }

    /// Get application data directory
    pub fn get_app_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to get user data directory")?
            .join(defaults::APP_DIR_NAME);
        Ok(data_dir)
    }

    /// Manager for the per-user configuration file
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_path: Self::get_config_dir()?.join(defaults::CONFIG_FILE),
        })
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read configuration file {:?}", self.config_path))?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(parse_error) => {
                warn!("⚠️  Configuration file could not be parsed: {}", parse_error);
                warn!("⚠️  Resetting to default configuration");

                let backup_path = self.corrupted_backup_path();
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;
                info!("✅ Reset to default configuration");
                Ok(default_config)
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn corrupted_backup_path(&self) -> PathBuf {
        self.config_path.with_extension("json.corrupted")
    }
}

/// Default configuration values
pub mod defaults {
    pub const APP_DIR_NAME: &str = "catalog-harvest";
    pub const CONFIG_FILE: &str = "config.json";

    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X) CatalogHarvest/1.0";
    pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 20;

    pub const LISTING_DELAY_SECONDS: f64 = 0.35;
    pub const DETAIL_DELAY_SECONDS: f64 = 0.55;
    pub const DELAY_JITTER_SECONDS: f64 = 0.25;

    pub const MIN_DURATION_MINUTES: u32 = 15;
    pub const LABELS_FILE: &str = "labels_scrapper.txt";

    pub const OUTPUT_DIR: &str = ".";
    pub const LINKS_FILE: &str = "list_links.txt";
    pub const TABLE_FILE: &str = "title_artist_label.csv";
    pub const REJECTED_BY_GENRE_FILE: &str = "rejected_by_genre.csv";
    pub const MISSING_DATE_FILE: &str = "album_date_missing.txt";

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = true;
    pub const LOG_PROGRESS_BARS: bool = true;
    pub const LOG_FILE_NAME: &str = "catalog-harvest.log";
}

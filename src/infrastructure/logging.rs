//! Logging system configuration and initialization
//!
//! - Console output on stderr so stdout stays free for the run summary
//! - Optional non-blocking file output in the log directory
//! - Optional JSON format for the file layer
//! - `RUST_LOG` overrides the configured level and quieting directives

#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use chrono::Local;
use once_cell::sync::Lazy;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::fmt::{self, time::FormatTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::infrastructure::config::{ConfigManager, defaults};

pub use crate::infrastructure::config::LoggingConfig;

// Keeps the file writer alive for the process lifetime
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Third-party targets held at `warn` unless trace logging is requested
const QUIET_TARGETS: [&str; 5] = ["reqwest", "hyper", "h2", "html5ever", "selectors"];

/// Local wall-clock timestamps with milliseconds
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Configured log directory, or `logs/` under the platform data directory, or `./logs`
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    if let Some(dir) = &config.log_dir {
        return dir.clone();
    }
    ConfigManager::get_app_data_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| PathBuf::from("logs"))
}

/// Filter used when `RUST_LOG` is not set
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        for target in QUIET_TARGETS {
            filter = filter.add_directive(format!("{}=warn", target).parse()?);
        }
    }
    for (target, level) in &config.module_filters {
        filter = filter.add_directive(
            format!("{}={}", target, level)
                .parse()
                .map_err(|e| anyhow!("Invalid module filter {}={}: {}", target, level, e))?,
        );
    }
    Ok(filter)
}

/// Initialize logging with the given configuration
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    if !config.file_output && !config.console_output {
        return Err(anyhow!("No logging output configured"));
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(config)?,
    };

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let log_dir = get_log_directory(config);
    if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        let file_appender = rolling::never(&log_dir, defaults::LOG_FILE_NAME);
        let (file_writer, file_guard) = non_blocking(file_appender);
        if let Ok(mut guards) = LOG_GUARDS.lock() {
            guards.push(file_guard);
        }

        let file_layer = fmt::Layer::new()
            .with_writer(file_writer)
            .with_timer(LocalTimeFormatter)
            .with_ansi(false);
        if config.json_format {
            layers.push(
                file_layer
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .boxed(),
            );
        } else {
            layers.push(file_layer.with_target(false).boxed());
        }
    }

    if config.console_output {
        layers.push(
            fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .boxed(),
        );
    }

    Registry::default()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        info!("Log file: {:?}", log_dir.join(defaults::LOG_FILE_NAME));
    }
    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== catalog-harvest {} ===", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console_output);
        assert!(config.file_output);
        assert!(!config.json_format);
    }

    #[test]
    fn quiets_dependencies_below_trace() {
        let filter = build_filter(&LoggingConfig::default()).unwrap().to_string();
        for target in QUIET_TARGETS {
            assert!(filter.contains(&format!("{}=warn", target)), "{}", filter);
        }

        let trace = LoggingConfig {
            level: "trace".to_string(),
            ..Default::default()
        };
        assert!(!build_filter(&trace).unwrap().to_string().contains("reqwest=warn"));
    }

    #[test]
    fn module_filters_are_applied() {
        let mut config = LoggingConfig::default();
        config.module_filters.insert("catalog_harvest".to_string(), "debug".to_string());
        let filter = build_filter(&config).unwrap().to_string();
        assert!(filter.contains("catalog_harvest=debug"), "{}", filter);
    }

    #[test]
    fn explicit_log_dir_wins() {
        let config = LoggingConfig {
            log_dir: Some(PathBuf::from("/tmp/harvest-logs")),
            ..Default::default()
        };
        assert_eq!(get_log_directory(&config), PathBuf::from("/tmp/harvest-logs"));
    }

    #[test]
    fn rejects_config_without_outputs() {
        let config = LoggingConfig {
            console_output: false,
            file_output: false,
            ..Default::default()
        };
        assert!(init_logging_with_config(&config).is_err());
    }
}

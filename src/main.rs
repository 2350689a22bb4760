//! catalog-harvest - command-line entry point
//!
//! Reads the label manifest, harvests listings and detail pages for the requested
//! release-date window, and writes the link list, result table and side reports.

#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use catalog_harvest::application::{HarvestPipeline, HarvestSettings, RunContext};
use catalog_harvest::domain::{DateRange, FilterCriteria, parse_day_month_year};
use catalog_harvest::infrastructure::logging::{init_logging_with_config, log_system_info};
use catalog_harvest::infrastructure::{
    AppConfig, ConfigManager, HttpClient, HttpClientConfig, PageSource, ReportWriter, read_manifest,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(about = "Collect catalog albums released in a date window from label listing pages")]
#[command(version)]
struct Args {
    /// First release date to keep (DD.MM.YYYY, inclusive)
    #[arg(long, value_parser = parse_date_arg)]
    from: NaiveDate,

    /// Last release date to keep (DD.MM.YYYY, inclusive)
    #[arg(long, value_parser = parse_date_arg)]
    to: NaiveDate,

    /// Minimum total length in minutes
    #[arg(long)]
    min_minutes: Option<u32>,

    /// Delay between listing page fetches, in seconds
    #[arg(long, value_parser = parse_delay_arg)]
    listing_delay: Option<f64>,

    /// Delay between album page fetches, in seconds
    #[arg(long, value_parser = parse_delay_arg)]
    detail_delay: Option<f64>,

    /// Label manifest (`<Name> - <URL>` per line)
    #[arg(long, env = "CATALOG_HARVEST_LABELS")]
    labels: Option<PathBuf>,

    /// Directory for output files
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, env = "CATALOG_HARVEST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<String>,

    /// Do not draw progress bars
    #[arg(long)]
    no_progress: bool,
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_day_month_year(raw).map_err(|e| format!("expected DD.MM.YYYY (e.g. 24.01.2026): {}", e))
}

fn parse_delay_arg(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.trim().parse().map_err(|e| format!("not a number: {}", e))?;
    if !value.is_finite() || value < 0.0 {
        return Err("delay must be zero or a positive number of seconds".to_string());
    }
    Ok(value)
}

impl Args {
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(minutes) = self.min_minutes {
            config.scrape.min_duration_minutes = minutes;
        }
        if let Some(delay) = self.listing_delay {
            config.scrape.listing_delay_seconds = delay;
        }
        if let Some(delay) = self.detail_delay {
            config.scrape.detail_delay_seconds = delay;
        }
        if let Some(labels) = &self.labels {
            config.scrape.labels_file = labels.clone();
        }
        if let Some(dir) = &self.out_dir {
            config.output.output_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.no_progress {
            config.logging.progress_bars = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let manager = match &args.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let mut config = manager.load_config().await.context("Failed to load configuration")?;
    args.apply_to(&mut config);

    init_logging_with_config(&config.logging)?;
    log_system_info();

    if DateRange::is_reversed(args.from, args.to) {
        warn!("⚠️ --from is later than --to, swapping them");
    }
    let range = DateRange::new(args.from, args.to);

    let manifest = read_manifest(&config.scrape.labels_file).await?;
    if manifest.labels.is_empty() {
        bail!("No usable labels in {:?}", config.scrape.labels_file);
    }

    let cancellation = CancellationToken::new();
    let interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Ctrl+C received, stopping after the current request and saving results");
            interrupt.cancel();
        }
    });

    let client = HttpClient::new(
        HttpClientConfig::from(&config.scrape),
        config.retry.clone(),
        cancellation.clone(),
    )
    .context("Failed to create HTTP client")?;
    let source: Arc<dyn PageSource> = Arc::new(client);

    let criteria = FilterCriteria::new(range, config.scrape.min_duration_minutes);
    let settings = HarvestSettings::from_config(criteria, &config.scrape).with_progress(config.logging.progress_bars);
    info!(
        "Labels: {}, dates {}, minimum {} min, delays {}s/{}s",
        manifest.labels.len(),
        range,
        criteria.min_minutes,
        settings.listing_delay_seconds,
        settings.detail_delay_seconds
    );

    let pipeline = HarvestPipeline::new(source, settings).context("Failed to build parsers")?;
    let outcome = pipeline.run(&manifest.labels, RunContext::new(cancellation)).await;

    let written = ReportWriter::new(config.output.clone())
        .write_all(&outcome.report())
        .context("Failed to write output files")?;

    println!("Files written:");
    for path in written.paths() {
        println!("  {}", path.display());
    }
    println!("{}", outcome.summary);
    Ok(())
}

//! Infrastructure layer for fetching, parsing and file I/O
//!
//! HTTP access with retry and politeness delays, markup parsing for listing and
//! detail pages, the label manifest, output reports, configuration and logging.

pub mod config; // Configuration file and defaults
pub mod http_client;
pub mod logging;
pub mod manifest;
pub mod parsing;
pub mod parsing_error;
pub mod report_writer;
pub mod retry_policy;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, LoggingConfig, OutputConfig, ScrapeConfig};
pub use http_client::{FetchError, HttpClient, HttpClientConfig, PageSource, polite_sleep};
pub use logging::{get_log_directory, init_logging_with_config};
pub use manifest::{Manifest, parse_manifest, read_manifest};
pub use parsing::{AlbumDetailParser, ListingContext, ListingParser, ParsingError, ParsingResult};
pub use report_writer::{HarvestReport, ReportError, ReportWriter, WrittenFiles, read_output_table};
pub use retry_policy::{BackoffRule, FailureClass, RetryPolicy};

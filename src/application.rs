//! Application layer module
//!
//! Orchestrates the harvest: listing scan per label, detail verification per candidate,
//! and the run context that carries cancellation and counters through both phases.

pub mod detail_fetcher;
pub mod listing_scanner;
pub mod pipeline;
pub mod progress;
pub mod run_context;

pub use detail_fetcher::{DetailFetcher, DetailOutcome};
pub use listing_scanner::{ListingScanner, ScanError};
pub use pipeline::{HarvestOutcome, HarvestPipeline, HarvestSettings};
pub use progress::HarvestProgress;
pub use run_context::{RunContext, RunStats, RunSummary};

//! Two-phase harvest
//!
//! Phase 1 scans the listings of every label and collects candidates. Phase 2 fetches
//! each candidate's detail page and runs it through the filter. Accepted records are
//! deduplicated at the end. Cancellation stops new fetches but everything accepted so far
//! is still returned for writing.

#![allow(clippy::uninlined_format_args)]

use std::collections::HashSet;
use std::sync::Arc;

use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::application::detail_fetcher::DetailFetcher;
use crate::application::listing_scanner::{ListingScanner, ScanError};
use crate::application::progress::{self, HarvestProgress};
use crate::application::run_context::{RunContext, RunSummary};
use crate::domain::filter::build_record;
use crate::domain::{
    Candidate, CategoryRejection, FilterCriteria, FilterPipeline, FilterVerdict, LabelSource, MissingDateDiagnostic,
    OutputRecord, RejectionReason, deduplicate,
};
use crate::infrastructure::config::ScrapeConfig;
use crate::infrastructure::http_client::{PageSource, polite_sleep};
use crate::infrastructure::parsing::{AlbumDetailParser, ListingParser, ParsingResult};
use crate::infrastructure::report_writer::HarvestReport;

/// Criteria plus politeness delays for one run
#[derive(Debug, Clone, Copy)]
pub struct HarvestSettings {
    pub criteria: FilterCriteria,
    pub listing_delay_seconds: f64,
    pub detail_delay_seconds: f64,
    pub delay_jitter_seconds: f64,
    /// Draw progress bars on stderr
    pub show_progress: bool,
}

impl HarvestSettings {
    pub fn from_config(criteria: FilterCriteria, scrape: &ScrapeConfig) -> Self {
        Self {
            criteria,
            listing_delay_seconds: scrape.listing_delay_seconds,
            detail_delay_seconds: scrape.detail_delay_seconds,
            delay_jitter_seconds: scrape.delay_jitter_seconds,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// No delays at all; for tests and offline sources
    pub fn without_delays(criteria: FilterCriteria) -> Self {
        Self {
            criteria,
            listing_delay_seconds: 0.0,
            detail_delay_seconds: 0.0,
            delay_jitter_seconds: 0.0,
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    /// Accepted and deduplicated, in fetch order
    pub records: Vec<OutputRecord>,
    /// Listing candidates in scan order
    pub candidates: Vec<Candidate>,
    pub category_rejections: Vec<CategoryRejection>,
    pub missing_dates: Vec<MissingDateDiagnostic>,
    pub summary: RunSummary,
}

impl HarvestOutcome {
    pub fn report(&self) -> HarvestReport<'_> {
        HarvestReport {
            records: &self.records,
            category_rejections: &self.category_rejections,
            missing_dates: &self.missing_dates,
        }
    }

    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.album_url.as_str())
    }
}

/// Results of the detail phase before deduplication
#[derive(Default)]
struct DetailPhase {
    accepted: Vec<OutputRecord>,
    category_rejections: Vec<CategoryRejection>,
    missing_dates: Vec<MissingDateDiagnostic>,
    interrupted: bool,
}

pub struct HarvestPipeline {
    scanner: ListingScanner,
    fetcher: DetailFetcher,
    filter: FilterPipeline,
    settings: HarvestSettings,
    progress: HarvestProgress,
}

impl HarvestPipeline {
    pub fn new(source: Arc<dyn PageSource>, settings: HarvestSettings) -> ParsingResult<Self> {
        Ok(Self {
            scanner: ListingScanner::new(
                Arc::clone(&source),
                ListingParser::new()?,
                settings.listing_delay_seconds,
                settings.delay_jitter_seconds,
            ),
            fetcher: DetailFetcher::new(source, AlbumDetailParser::new()?),
            filter: FilterPipeline::new(settings.criteria),
            progress: HarvestProgress::new(settings.show_progress),
            settings,
        })
    }

    pub async fn run(&self, labels: &[LabelSource], mut context: RunContext) -> HarvestOutcome {
        context.stats_mut().labels = labels.len();
        info!(
            "🚀 Harvesting {} labels, release dates {}, at least {} min",
            labels.len(),
            self.settings.criteria.range,
            self.settings.criteria.min_minutes
        );

        let (candidates, listing_interrupted) = self.collect_candidates(labels, &mut context).await;
        context.stats_mut().candidates = candidates.len();
        info!("✅ Candidates after listing date: {}", candidates.len());

        let details = if listing_interrupted {
            DetailPhase {
                interrupted: true,
                ..Default::default()
            }
        } else {
            self.verify_candidates(&candidates, &mut context).await
        };

        let accepted_before_dedup = details.accepted.len();
        let deduped = deduplicate(details.accepted);
        let stats = context.stats_mut();
        stats.accepted_before_dedup = accepted_before_dedup;
        stats.duplicates_removed = deduped.duplicates_removed;

        if details.interrupted {
            warn!("🟡 Interrupted, keeping {} records collected so far", deduped.records.len());
        }
        info!(
            "🏁 {} accepted ({} duplicates removed)",
            deduped.records.len(),
            deduped.duplicates_removed
        );

        HarvestOutcome {
            records: deduped.records,
            candidates,
            category_rejections: details.category_rejections,
            missing_dates: details.missing_dates,
            summary: context.finish(details.interrupted),
        }
    }

    /// Phase 1: all labels, with `(album_url, label)` repeats removed across pages
    async fn collect_candidates(&self, labels: &[LabelSource], context: &mut RunContext) -> (Vec<Candidate>, bool) {
        let bar = self.progress.listing_bar(labels.len());
        let (candidates, interrupted) = self.scan_labels(labels, context, &bar).await;
        progress::close(&bar, interrupted);
        (candidates, interrupted)
    }

    async fn scan_labels(
        &self,
        labels: &[LabelSource],
        context: &mut RunContext,
        bar: &ProgressBar,
    ) -> (Vec<Candidate>, bool) {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut candidates = Vec::new();

        for (index, label) in labels.iter().enumerate() {
            if context.is_cancelled() {
                return (candidates, true);
            }

            match self.scanner.scan_label(label, self.settings.criteria.range, context, bar).await {
                Ok(found) => {
                    for candidate in found {
                        let (url, label_name) = candidate.identity();
                        if seen.insert((url.to_string(), label_name.to_string())) {
                            candidates.push(candidate);
                        }
                    }
                }
                Err(ScanError::Cancelled) => return (candidates, true),
                Err(e) => {
                    warn!("❌ Skipping label '{}': {}", label.name, e);
                    context.stats_mut().label_failures += 1;
                }
            }
            progress::complete_label(bar, index + 1);
        }

        (candidates, false)
    }

    /// Phase 2: detail page, filter and side reports for each candidate in order
    async fn verify_candidates(&self, candidates: &[Candidate], context: &mut RunContext) -> DetailPhase {
        let bar = self.progress.detail_bar(candidates.len());
        let phase = self.verify_each(candidates, context, &bar).await;
        progress::close(&bar, phase.interrupted);
        phase
    }

    async fn verify_each(&self, candidates: &[Candidate], context: &mut RunContext, bar: &ProgressBar) -> DetailPhase {
        let mut phase = DetailPhase::default();

        for (index, candidate) in candidates.iter().enumerate() {
            if context.is_cancelled() {
                phase.interrupted = true;
                break;
            }

            let outcome = match self.fetcher.fetch(candidate).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    phase.interrupted = true;
                    break;
                }
            };
            let details = outcome.details();
            let decision = self.filter.evaluate(candidate, details);

            if decision.detail_date_missing {
                context.stats_mut().missing_detail_dates += 1;
            }

            match &decision.verdict {
                FilterVerdict::Accepted(record) => {
                    debug!("[{}/{}] accepted {}", index + 1, candidates.len(), record.album_url);
                    if decision.detail_date_missing {
                        phase.missing_dates.push(MissingDateDiagnostic {
                            label: candidate.label_name.clone(),
                            album_url: candidate.album_url.clone(),
                            listing_release_date: candidate.listing_release_date,
                            title: record.title.clone(),
                            contributors: record.contributors.clone(),
                        });
                    }
                    phase.accepted.push(record.clone());
                }
                FilterVerdict::Rejected(reason) => {
                    debug!(
                        "[{}/{}] rejected {}: {}",
                        index + 1,
                        candidates.len(),
                        candidate.album_url,
                        reason
                    );
                    context.stats_mut().record_rejection(reason);
                    if let (RejectionReason::WrongCategory { observed }, Some(details), Some(date)) =
                        (reason, details, decision.release_date)
                    {
                        phase.category_rejections.push(CategoryRejection {
                            record: build_record(candidate, details, date),
                            observed_category: observed.clone(),
                        });
                    }
                }
            }

            bar.inc(1);

            if !polite_sleep(
                self.settings.detail_delay_seconds,
                self.settings.delay_jitter_seconds,
                context.cancellation(),
            )
            .await
            {
                phase.interrupted = true;
                break;
            }
        }

        phase
    }
}

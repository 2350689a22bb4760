//! Listing scan for one label
//!
//! Fetches page 1, follows to page 2 when the navigation links to it, and collects the
//! date-attributed candidates of both pages. Unavailable pages are skipped; an
//! unusable label URL aborts only that label.

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use indicatif::ProgressBar;
use scraper::Html;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::application::run_context::RunContext;
use crate::domain::{Candidate, DateRange, LabelSource};
use crate::infrastructure::http_client::{PageSource, polite_sleep};
use crate::infrastructure::parsing::{
    LISTING_PAGE_CAP, ListingContext, ListingParser, ParsingError, build_label_page_url, normalize_label_base,
};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Label '{label}' has an unusable URL '{url}': {reason}")]
    InvalidLabelUrl { label: String, url: String, reason: String },

    #[error("Listing page could not be parsed: {0}")]
    Parsing(#[from] ParsingError),

    #[error("Scan cancelled")]
    Cancelled,
}

/// Candidates and pagination hint extracted from one listing page
struct PageScan {
    candidates: Vec<Candidate>,
    has_page_two: bool,
}

pub struct ListingScanner {
    source: Arc<dyn PageSource>,
    parser: ListingParser,
    delay_seconds: f64,
    jitter_seconds: f64,
}

impl ListingScanner {
    pub fn new(source: Arc<dyn PageSource>, parser: ListingParser, delay_seconds: f64, jitter_seconds: f64) -> Self {
        Self {
            source,
            parser,
            delay_seconds,
            jitter_seconds,
        }
    }

    /// Scan up to [`LISTING_PAGE_CAP`] pages of a label. Candidates come back in page
    /// order; the caller removes cross-page repeats. `progress` advances once per page.
    pub async fn scan_label(
        &self,
        label: &LabelSource,
        range: DateRange,
        context: &mut RunContext,
        progress: &ProgressBar,
    ) -> Result<Vec<Candidate>, ScanError> {
        let label_url = Url::parse(&label.url).map_err(|e| ScanError::InvalidLabelUrl {
            label: label.name.clone(),
            url: label.url.clone(),
            reason: e.to_string(),
        })?;
        let base = normalize_label_base(&label_url);

        let mut candidates = Vec::new();
        for page in 1..=LISTING_PAGE_CAP {
            if context.is_cancelled() {
                return Err(ScanError::Cancelled);
            }

            let page_url = build_label_page_url(&base, page);
            let fetched = self.source.fetch_page(page_url.as_str()).await;
            let markup = match fetched {
                Ok(markup) => Some(markup),
                Err(e) if e.is_cancelled() => return Err(ScanError::Cancelled),
                Err(e) => {
                    warn!("⚠️ Listing page {} of '{}' unavailable: {}", page, label.name, e);
                    None
                }
            };

            let has_next = match markup {
                Some(markup) => {
                    context.stats_mut().listing_pages_fetched += 1;
                    let listing = ListingContext::new(page_url.as_str(), &label.name, range).with_page_number(page);
                    let scan = self.scan_page(&markup, &listing, &base)?;
                    debug!(
                        "'{}' page {}: {} candidates in range",
                        label.name,
                        page,
                        scan.candidates.len()
                    );
                    candidates.extend(scan.candidates);
                    scan.has_page_two
                }
                None => {
                    context.stats_mut().listing_pages_unavailable += 1;
                    false
                }
            };
            progress.inc(1);

            if !polite_sleep(self.delay_seconds, self.jitter_seconds, context.cancellation()).await {
                return Err(ScanError::Cancelled);
            }

            // Only page 1 decides whether page 2 exists
            if page == 1 && !has_next {
                break;
            }
        }

        info!("🔎 '{}': {} candidates from listing", label.name, candidates.len());
        Ok(candidates)
    }

    // Html is not Send; keep it inside this synchronous scope
    fn scan_page(&self, markup: &str, listing: &ListingContext, base: &Url) -> Result<PageScan, ScanError> {
        let html = Html::parse_document(markup);
        let candidates = self.parser.extract_candidates(&html, listing)?;
        let has_page_two = listing.page_number == 1 && self.parser.has_page_two(&html, base);
        Ok(PageScan {
            candidates,
            has_page_two,
        })
    }
}

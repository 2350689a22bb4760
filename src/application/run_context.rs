//! Run-level state passed through the harvest stages
//!
//! The cancellation token and the counters live here instead of in globals; a finished
//! run hands them back as a [`RunSummary`].

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::domain::RejectionReason;

/// Counters collected while a run progresses
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub labels: usize,
    /// Labels whose listing scan aborted on an unexpected fault
    pub label_failures: usize,
    pub listing_pages_fetched: usize,
    pub listing_pages_unavailable: usize,
    pub candidates: usize,
    pub fetch_errors: usize,
    pub date_mismatches: usize,
    pub too_short: usize,
    pub wrong_category: usize,
    /// Candidates whose detail page had no release date (listing date used)
    pub missing_detail_dates: usize,
    pub accepted_before_dedup: usize,
    pub duplicates_removed: usize,
}

impl RunStats {
    pub fn record_rejection(&mut self, reason: &RejectionReason) {
        match reason {
            RejectionReason::FetchError => self.fetch_errors += 1,
            RejectionReason::DateMismatch { .. } => self.date_mismatches += 1,
            RejectionReason::TooShort { .. } => self.too_short += 1,
            RejectionReason::WrongCategory { .. } => self.wrong_category += 1,
        }
    }

    pub fn rejected(&self) -> usize {
        self.fetch_errors + self.date_mismatches + self.too_short + self.wrong_category
    }

    pub fn accepted(&self) -> usize {
        self.accepted_before_dedup.saturating_sub(self.duplicates_removed)
    }
}

pub struct RunContext {
    cancellation: CancellationToken,
    stats: RunStats,
    started_at: DateTime<Local>,
}

impl RunContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            stats: RunStats::default(),
            started_at: Local::now(),
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn stats_mut(&mut self) -> &mut RunStats {
        &mut self.stats
    }

    pub fn finish(self, interrupted: bool) -> RunSummary {
        RunSummary {
            stats: self.stats,
            interrupted,
            started_at: self.started_at,
            finished_at: Local::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub stats: RunStats,
    /// The run stopped early on user request; outputs hold partial results
    pub interrupted: bool,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(f, "Summary:")?;
        writeln!(f, "  Labels: {} ({} failed)", s.labels, s.label_failures)?;
        writeln!(
            f,
            "  Listing pages: {} fetched, {} unavailable",
            s.listing_pages_fetched, s.listing_pages_unavailable
        )?;
        writeln!(f, "  Candidates after listing date: {}", s.candidates)?;
        writeln!(f, "  Rejected, detail page unavailable: {}", s.fetch_errors)?;
        writeln!(f, "  Rejected, detail date out of range: {}", s.date_mismatches)?;
        writeln!(f, "  Rejected, too short: {}", s.too_short)?;
        writeln!(f, "  Rejected, genre not Classical: {}", s.wrong_category)?;
        writeln!(f, "  Detail date missing (listing date used): {}", s.missing_detail_dates)?;
        writeln!(f, "  Accepted before dedup: {}", s.accepted_before_dedup)?;
        writeln!(f, "  Duplicates removed: {}", s.duplicates_removed)?;
        write!(f, "  Accepted: {}", s.accepted())?;
        if self.interrupted {
            write!(f, "\n  Interrupted: partial results written")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn rejection_counters_are_disjoint() {
        let mut stats = RunStats::default();
        stats.record_rejection(&RejectionReason::FetchError);
        stats.record_rejection(&RejectionReason::DateMismatch {
            detail_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        });
        stats.record_rejection(&RejectionReason::TooShort { duration_seconds: 60 });
        stats.record_rejection(&RejectionReason::WrongCategory { observed: None });
        stats.record_rejection(&RejectionReason::WrongCategory {
            observed: Some("Jazz".to_string()),
        });

        assert_eq!(stats.fetch_errors, 1);
        assert_eq!(stats.date_mismatches, 1);
        assert_eq!(stats.too_short, 1);
        assert_eq!(stats.wrong_category, 2);
        assert_eq!(stats.rejected(), 5);
    }

    #[test]
    fn summary_reports_interruption() {
        let token = CancellationToken::new();
        let mut context = RunContext::new(token.clone());
        context.stats_mut().accepted_before_dedup = 4;
        context.stats_mut().duplicates_removed = 1;
        token.cancel();
        assert!(context.is_cancelled());

        let summary = context.finish(true);
        let text = summary.to_string();
        assert!(text.contains("Accepted: 3"));
        assert!(text.contains("Interrupted"));
        assert!(summary.finished_at >= summary.started_at);
    }
}

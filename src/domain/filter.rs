//! Candidate filter state machine
//!
//! A candidate moves `Candidate → DetailFetched → DateReconciled → DurationChecked →
//! CategoryChecked → Accepted`, and may drop to `Rejected` at any step. The order is
//! fixed so that each rejected candidate is counted under exactly one reason.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::entities::{AlbumDetails, Candidate, DateRange, OutputRecord};

/// Category every accepted album must be rooted in
pub const REQUIRED_CATEGORY: &str = "Classical";

/// Placeholder written to the side report when no category was found
pub const MISSING_CATEGORY: &str = "(missing)";

/// User-provided acceptance criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub range: DateRange,
    pub min_minutes: u32,
}

impl FilterCriteria {
    pub fn new(range: DateRange, min_minutes: u32) -> Self {
        Self { range, min_minutes }
    }

    pub fn min_seconds(&self) -> u32 {
        self.min_minutes.saturating_mul(60)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// Detail page unavailable or unparseable
    FetchError,
    /// Authoritative detail-page date lies outside the range
    DateMismatch { detail_date: NaiveDate },
    TooShort { duration_seconds: u32 },
    WrongCategory { observed: Option<String> },
}

impl RejectionReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FetchError => "fetch_error",
            Self::DateMismatch { .. } => "date_mismatch",
            Self::TooShort { .. } => "too_short",
            Self::WrongCategory { .. } => "wrong_category",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchError => write!(f, "detail page unavailable"),
            Self::DateMismatch { detail_date } => {
                write!(f, "detail release date {} outside range", detail_date)
            }
            Self::TooShort { duration_seconds } => {
                write!(f, "total length {}s below minimum", duration_seconds)
            }
            Self::WrongCategory { observed } => write!(
                f,
                "primary category {} is not {}",
                observed.as_deref().unwrap_or(MISSING_CATEGORY),
                REQUIRED_CATEGORY
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateState {
    Candidate,
    DetailFetched,
    DateReconciled,
    DurationChecked,
    CategoryChecked,
    Accepted,
    Rejected(RejectionReason),
}

/// Row of the rejected-by-category side report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRejection {
    pub record: OutputRecord,
    pub observed_category: Option<String>,
}

impl CategoryRejection {
    pub fn observed_label(&self) -> &str {
        self.observed_category.as_deref().unwrap_or(MISSING_CATEGORY)
    }
}

/// Accepted album whose detail page carried no release date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingDateDiagnostic {
    pub label: String,
    pub album_url: String,
    pub listing_release_date: NaiveDate,
    pub title: String,
    pub contributors: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    Accepted(OutputRecord),
    Rejected(RejectionReason),
}

/// Result of running one candidate through the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDecision {
    pub verdict: FilterVerdict,
    /// Every state visited, in order, ending in `Accepted` or `Rejected`
    pub trace: Vec<CandidateState>,
    /// Reconciled date, known once the date step ran
    pub release_date: Option<NaiveDate>,
    /// True when the listing date stood in for a missing detail-page date
    pub detail_date_missing: bool,
}

impl FilterDecision {
    pub fn accepted(&self) -> Option<&OutputRecord> {
        match &self.verdict {
            FilterVerdict::Accepted(record) => Some(record),
            FilterVerdict::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&RejectionReason> {
        match &self.verdict {
            FilterVerdict::Rejected(reason) => Some(reason),
            FilterVerdict::Accepted(_) => None,
        }
    }
}

/// Applies date reconciliation, duration and category gates in that order
#[derive(Debug, Clone, Copy)]
pub struct FilterPipeline {
    criteria: FilterCriteria,
}

impl FilterPipeline {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self { criteria }
    }

    /// `details` is `None` when the detail page could not be fetched or parsed
    pub fn evaluate(&self, candidate: &Candidate, details: Option<&AlbumDetails>) -> FilterDecision {
        let mut trace = vec![CandidateState::Candidate];

        let Some(details) = details else {
            return reject(trace, RejectionReason::FetchError, None, false);
        };
        trace.push(CandidateState::DetailFetched);

        let (release_date, detail_date_missing) = match details.release_date {
            Some(detail_date) if !self.criteria.range.contains(detail_date) => {
                return reject(
                    trace,
                    RejectionReason::DateMismatch { detail_date },
                    Some(detail_date),
                    false,
                );
            }
            Some(detail_date) => (detail_date, false),
            None => (candidate.listing_release_date, true),
        };
        trace.push(CandidateState::DateReconciled);

        if details.duration_seconds < self.criteria.min_seconds() {
            return reject(
                trace,
                RejectionReason::TooShort {
                    duration_seconds: details.duration_seconds,
                },
                Some(release_date),
                detail_date_missing,
            );
        }
        trace.push(CandidateState::DurationChecked);

        if !is_required_category(details.primary_category.as_deref()) {
            return reject(
                trace,
                RejectionReason::WrongCategory {
                    observed: details.primary_category.clone(),
                },
                Some(release_date),
                detail_date_missing,
            );
        }
        trace.push(CandidateState::CategoryChecked);
        trace.push(CandidateState::Accepted);

        FilterDecision {
            verdict: FilterVerdict::Accepted(build_record(candidate, details, release_date)),
            trace,
            release_date: Some(release_date),
            detail_date_missing,
        }
    }
}

fn reject(
    mut trace: Vec<CandidateState>,
    reason: RejectionReason,
    release_date: Option<NaiveDate>,
    detail_date_missing: bool,
) -> FilterDecision {
    trace.push(CandidateState::Rejected(reason.clone()));
    FilterDecision {
        verdict: FilterVerdict::Rejected(reason),
        trace,
        release_date,
        detail_date_missing,
    }
}

/// Case-insensitive "starts with Classical"
pub fn is_required_category(category: Option<&str>) -> bool {
    category
        .map(|c| c.trim().to_lowercase().starts_with(&REQUIRED_CATEGORY.to_lowercase()))
        .unwrap_or(false)
}

pub fn build_record(candidate: &Candidate, details: &AlbumDetails, release_date: NaiveDate) -> OutputRecord {
    OutputRecord {
        title: details.title.clone(),
        contributors: details.contributors.clone(),
        label: candidate.label_name.clone(),
        album_url: candidate.album_url.clone(),
        release_date,
    }
}

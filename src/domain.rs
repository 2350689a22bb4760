//! Domain module - core entities and pure transforms
//!
//! Everything here is free of I/O: release-date recognition, the candidate filter
//! state machine and identity deduplication.

pub mod dedup;
pub mod entities;
pub mod filter;
pub mod release_date;

pub use dedup::{DedupKey, DedupOutcome, deduplicate};
pub use entities::{
    AlbumDetails, Candidate, DateRange, LabelSource, OutputRecord, format_day_month_year,
    parse_day_month_year,
};
pub use filter::{
    CandidateState, CategoryRejection, FilterCriteria, FilterDecision, FilterPipeline,
    FilterVerdict, MissingDateDiagnostic, RejectionReason,
};
pub use release_date::{ReleaseDateExtractor, ReleaseDateMatcher, extract_release_date};

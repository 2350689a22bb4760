//! Identity-based deduplication of accepted records

use std::collections::HashSet;

use super::entities::OutputRecord;

/// Normalized `(title, contributors, label)` identity of a catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    title: String,
    contributors: String,
    label: String,
}

impl DedupKey {
    pub fn from_record(record: &OutputRecord) -> Self {
        Self {
            title: normalize_key_part(&record.title),
            contributors: normalize_key_part(&record.contributors),
            label: normalize_key_part(&record.label),
        }
    }
}

/// Collapse whitespace runs, then apply full Unicode case folding ("ß" and "SS" agree)
pub fn normalize_key_part(value: &str) -> String {
    caseless::default_case_fold_str(&value.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupOutcome {
    pub records: Vec<OutputRecord>,
    pub duplicates_removed: usize,
}

/// Keep the first record of every identity, preserving input order
pub fn deduplicate(records: Vec<OutputRecord>) -> DedupOutcome {
    let mut seen = HashSet::with_capacity(records.len());
    let mut kept = Vec::with_capacity(records.len());
    let mut duplicates_removed = 0;

    for record in records {
        if seen.insert(DedupKey::from_record(&record)) {
            kept.push(record);
        } else {
            tracing::debug!("Dropping duplicate album {} ({})", record.title, record.album_url);
            duplicates_removed += 1;
        }
    }

    DedupOutcome {
        records: kept,
        duplicates_removed,
    }
}

//! Domain entities
//!
//! Core records that flow through the harvest pipeline, from the label manifest
//! down to the reconciled output rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Day.month.year format used for user input and every output file
pub const DAY_MONTH_YEAR: &str = "%d.%m.%Y";

/// One label from the manifest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelSource {
    pub name: String,
    pub url: String,
}

impl LabelSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// An album that passed the listing-date gate and awaits detail verification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub album_url: String,
    pub label_name: String,
    pub listing_release_date: NaiveDate,
}

impl Candidate {
    /// Identity used to avoid re-adding a URL seen on another listing page of the same label
    pub fn identity(&self) -> (&str, &str) {
        (&self.album_url, &self.label_name)
    }
}

/// Metadata extracted from a single album detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumDetails {
    pub title: String,
    pub contributors: String,
    pub duration_seconds: u32,
    pub duration_hms: String,
    pub release_date: Option<NaiveDate>,
    pub primary_category: Option<String>,
}

/// A reconciled, accepted album ready for output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRecord {
    pub title: String,
    pub contributors: String,
    pub label: String,
    pub album_url: String,
    pub release_date: NaiveDate,
}

/// Inclusive release-date window
///
/// Bounds given in the wrong order are swapped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start > end {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    /// True when the bounds had to be swapped to build a valid range
    pub fn is_reversed(start: NaiveDate, end: NaiveDate) -> bool {
        start > end
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {}",
            format_day_month_year(self.start),
            format_day_month_year(self.end)
        )
    }
}

/// Parse a `DD.MM.YYYY` date as typed by the user
pub fn parse_day_month_year(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), DAY_MONTH_YEAR)
}

pub fn format_day_month_year(date: NaiveDate) -> String {
    date.format(DAY_MONTH_YEAR).to_string()
}

//! Parsing context for listing pages

use crate::domain::DateRange;

/// Where a listing page came from and which dates it should keep
#[derive(Debug, Clone)]
pub struct ListingContext {
    /// URL the page was fetched from; relative links resolve against it
    pub page_url: String,

    /// Label the page belongs to
    pub label_name: String,

    /// Only candidates released inside this range survive
    pub range: DateRange,

    /// 1-based page number within the label
    pub page_number: u32,
}

impl ListingContext {
    pub fn new(page_url: impl Into<String>, label_name: impl Into<String>, range: DateRange) -> Self {
        Self {
            page_url: page_url.into(),
            label_name: label_name.into(),
            range,
            page_number: 1,
        }
    }

    pub fn with_page_number(mut self, page_number: u32) -> Self {
        self.page_number = page_number;
        self
    }
}

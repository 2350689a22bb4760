//! Parsing error types
//!
//! Structural absence (no date, no duration, no title) is not an error in this crate;
//! these variants cover the cases where the input itself cannot be worked with.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed {
        url: String,
        reason: String,
        base_url: Option<String>,
    },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn url_resolution_failed(url: &str, reason: impl ToString, base_url: Option<&str>) -> Self {
        Self::UrlResolutionFailed {
            url: url.to_string(),
            reason: reason.to_string(),
            base_url: base_url.map(str::to_string),
        }
    }
}

impl From<regex::Error> for ParsingError {
    fn from(error: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: String::new(),
            reason: error.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;

//! Release-date phrase recognition
//!
//! Catalog pages announce release dates in free text ("Released by X on Jan 5, 2026",
//! "To be released on 2/27/26", ...). Each phrasing is a [`ReleaseDateMatcher`]; a
//! [`ReleaseDateExtractor`] runs them in priority order and keeps the first date that
//! actually parses. Month-name phrasings are registered before numeric ones because
//! the numeric patterns are looser and must not shadow the qualified forms.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Verb phrase introducing a release date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePhrase {
    /// "Released by <someone> on <date>"
    ReleasedBy,
    /// "Released on <date>"
    ReleasedOn,
    /// "To be released on <date>"
    ToBeReleased,
}

impl ReleasePhrase {
    pub const ALL: [ReleasePhrase; 3] = [Self::ReleasedBy, Self::ReleasedOn, Self::ToBeReleased];

    fn prefix(self) -> &'static str {
        match self {
            Self::ReleasedBy => r"\bReleased by .*? on ",
            Self::ReleasedOn => r"\bReleased on ",
            Self::ToBeReleased => r"\bTo be released on ",
        }
    }
}

/// Shape of the date that follows the phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateNotation {
    /// `Jan 5, 2026`, `Jan. 5, 2026`, `January 5, 2026`
    MonthName,
    /// `2/27/26`, `2/27/2026`
    Numeric,
}

impl DateNotation {
    fn capture(self) -> &'static str {
        match self {
            Self::MonthName => r"([A-Za-z.]+ \d{1,2}, \d{4})",
            Self::Numeric => r"(\d{1,2}/\d{1,2}/\d{2,4})",
        }
    }

    fn parse(self, raw: &str) -> Option<NaiveDate> {
        match self {
            Self::MonthName => parse_month_name_date(raw),
            Self::Numeric => parse_numeric_date(raw),
        }
    }
}

/// A single strategy for pulling a release date out of text
pub trait ReleaseDateMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the parsed date when the phrase is present and its date is valid
    fn match_date(&self, text: &str) -> Option<NaiveDate>;
}

/// Regex-backed matcher for one phrase/notation pair
pub struct PhraseMatcher {
    name: &'static str,
    pattern: Regex,
    notation: DateNotation,
}

impl PhraseMatcher {
    pub fn new(phrase: ReleasePhrase, notation: DateNotation) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            "(?i){}{}",
            phrase.prefix(),
            notation.capture()
        ))?;
        let name = match (phrase, notation) {
            (ReleasePhrase::ReleasedBy, DateNotation::MonthName) => "released_by_month",
            (ReleasePhrase::ReleasedOn, DateNotation::MonthName) => "released_on_month",
            (ReleasePhrase::ToBeReleased, DateNotation::MonthName) => "to_be_released_month",
            (ReleasePhrase::ReleasedBy, DateNotation::Numeric) => "released_by_numeric",
            (ReleasePhrase::ReleasedOn, DateNotation::Numeric) => "released_on_numeric",
            (ReleasePhrase::ToBeReleased, DateNotation::Numeric) => "to_be_released_numeric",
        };
        Ok(Self {
            name,
            pattern,
            notation,
        })
    }
}

impl ReleaseDateMatcher for PhraseMatcher {
    fn name(&self) -> &'static str {
        self.name
    }

    fn match_date(&self, text: &str) -> Option<NaiveDate> {
        let captures = self.pattern.captures(text)?;
        self.notation.parse(captures.get(1)?.as_str())
    }
}

/// Ordered chain of matchers; the first success wins
pub struct ReleaseDateExtractor {
    matchers: Vec<Box<dyn ReleaseDateMatcher>>,
}

impl ReleaseDateExtractor {
    pub fn new(matchers: Vec<Box<dyn ReleaseDateMatcher>>) -> Self {
        Self { matchers }
    }

    /// All month-name phrasings first, then the numeric ones
    pub fn standard() -> Result<Self, regex::Error> {
        let mut matchers: Vec<Box<dyn ReleaseDateMatcher>> = Vec::with_capacity(6);
        for notation in [DateNotation::MonthName, DateNotation::Numeric] {
            for phrase in ReleasePhrase::ALL {
                matchers.push(Box::new(PhraseMatcher::new(phrase, notation)?));
            }
        }
        Ok(Self::new(matchers))
    }

    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Extract a release date from arbitrary text; whitespace is collapsed first
    pub fn extract(&self, text: &str) -> Option<NaiveDate> {
        if text.trim().is_empty() {
            return None;
        }
        let collapsed = collapse_whitespace(text);
        self.matchers
            .iter()
            .find_map(|matcher| matcher.match_date(&collapsed))
    }
}

static STANDARD_EXTRACTOR: Lazy<ReleaseDateExtractor> = Lazy::new(|| {
    ReleaseDateExtractor::standard().expect("release-date patterns are valid regexes")
});

/// Shared extractor with the standard phrase chain
pub fn standard_extractor() -> &'static ReleaseDateExtractor {
    &STANDARD_EXTRACTOR
}

/// Convenience wrapper over [`standard_extractor`]
pub fn extract_release_date(text: &str) -> Option<NaiveDate> {
    standard_extractor().extract(text)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse `Jan 5, 2026`, `Jan. 5, 2026`, `Sept 5, 2026` or `January 5, 2026`
pub fn parse_month_name_date(raw: &str) -> Option<NaiveDate> {
    let collapsed = collapse_whitespace(raw);
    let (month, rest) = collapsed.split_once(' ')?;

    let mut month = month.replace('.', "");
    if month.eq_ignore_ascii_case("sept") {
        month = "Sep".to_string();
    }
    let normalized = format!("{} {}", month, rest);

    ["%b %d, %Y", "%B %d, %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
}

static NUMERIC_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2}|\d{4})$").expect("numeric date pattern is valid")
});

/// Parse a slash date, month/day/year first with day/month/year as a last resort
///
/// The fallback is ambiguous by construction: `02/03/26` always reads as Feb 3, and
/// only dates that are impossible as month/day (e.g. `13/02/26`) reach the day/month
/// interpretation.
pub fn parse_numeric_date(raw: &str) -> Option<NaiveDate> {
    let collapsed = collapse_whitespace(raw);
    let captures = NUMERIC_DATE.captures(&collapsed)?;

    let first: u32 = captures[1].parse().ok()?;
    let second: u32 = captures[2].parse().ok()?;
    let year = expand_year(&captures[3])?;

    NaiveDate::from_ymd_opt(year, first, second)
        .or_else(|| NaiveDate::from_ymd_opt(year, second, first))
}

/// POSIX `%y` pivot: 00-68 → 2000s, 69-99 → 1900s
fn expand_year(raw: &str) -> Option<i32> {
    let value: i32 = raw.parse().ok()?;
    match raw.len() {
        2 if value <= 68 => Some(2000 + value),
        2 => Some(1900 + value),
        4 => Some(value),
        _ => None,
    }
}

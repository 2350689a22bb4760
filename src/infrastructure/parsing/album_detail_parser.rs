//! Album detail page parser
//!
//! Extracts title, main artists, total length, the authoritative release date and the
//! first genre category of the "About the album" section. Page markup is treated as
//! free-form text; nothing here depends on class names or structured data.

#![allow(clippy::uninlined_format_args)]

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, trace};

use super::markup::{compile_selector, flattened_text, text_lines};
use super::DocumentParser;
use crate::domain::release_date::{ReleaseDateExtractor, standard_extractor};
use crate::domain::AlbumDetails;
use crate::infrastructure::parsing_error::ParsingResult;

/// Lines scanned for a release line before falling back to the whole page
pub const RELEASE_LINE_WINDOW: usize = 120;

/// Lines after the "About the album" heading searched for the genre field
pub const ABOUT_SECTION_WINDOW: usize = 160;

/// Lines after a bare "Genre:" searched for its value
const GENRE_VALUE_LOOKAHEAD: usize = 9;

const ABOUT_HEADING: &str = "about the album";
const TITLE_SEPARATOR: &str = " by ";
const MAIN_ARTISTS_LABEL: &str = "main artists:";
const CLASSICAL_PREFIX: &str = "classical";
const GENRE_DELIMITERS: [&str; 5] = ["/", ",", "|", "›", ">"];

pub struct AlbumDetailParser {
    heading: Selector,
    blocks: Selector,
    anchors: Selector,
    total_length: Regex,
    release_line: Regex,
    line_prefix: Regex,
    next_field: Regex,
    extractor: &'static ReleaseDateExtractor,
}

impl AlbumDetailParser {
    pub fn new() -> ParsingResult<Self> {
        Ok(Self {
            heading: compile_selector("h1")?,
            blocks: compile_selector("li, p, div")?,
            anchors: compile_selector("a")?,
            total_length: Regex::new(r"(?i)Total length:\s*([0-9]{2}:[0-9]{2}:[0-9]{2})")?,
            release_line: Regex::new(r"(?i)\b(released|to be released)\b")?,
            line_prefix: Regex::new(r"^[\s#*\-•]+")?,
            next_field: Regex::new(r"(?i)^(main artists|composer|label|total length|available in)\b")?,
            extractor: standard_extractor(),
        })
    }

    /// Parse a detail page. `None` when the total length is missing or when neither a
    /// title nor main artists could be found.
    pub fn parse(&self, html: &Html) -> Option<AlbumDetails> {
        let lines = text_lines(html.root_element());

        let title = self.extract_title(html);
        let contributors = self.extract_main_artists(html);

        let page_text = lines.join("\n");
        let Some(duration_hms) = self
            .total_length
            .captures(&page_text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
        else {
            debug!("Detail page has no total length");
            return None;
        };
        let duration_seconds = hms_to_seconds(&duration_hms)?;

        if title.is_empty() && contributors.is_empty() {
            debug!("Detail page has neither title nor main artists");
            return None;
        }

        let release_date = self.extract_release_date(&lines);
        let primary_category = self.extract_primary_category(&lines);
        trace!(
            "Parsed '{}' by '{}': {} ({}s), released {:?}, genre {:?}",
            title, contributors, duration_hms, duration_seconds, release_date, primary_category
        );

        Some(AlbumDetails {
            title,
            contributors,
            duration_seconds,
            duration_hms,
            release_date,
            primary_category,
        })
    }

    fn extract_title(&self, html: &Html) -> String {
        let Some(heading) = html.select(&self.heading).next() else {
            return String::new();
        };
        let text = flattened_text(heading);
        match text.split_once(TITLE_SEPARATOR) {
            Some((title, _)) => title.trim().to_string(),
            None => text.trim().to_string(),
        }
    }

    fn extract_main_artists(&self, html: &Html) -> String {
        let Some(block) = html
            .select(&self.blocks)
            .find(|b| flattened_text(*b).to_lowercase().starts_with(MAIN_ARTISTS_LABEL))
        else {
            return String::new();
        };

        let names: Vec<String> = block
            .select(&self.anchors)
            .map(flattened_text)
            .filter(|name| !name.is_empty())
            .collect();
        if !names.is_empty() {
            return names.join(", ");
        }

        let text = flattened_text(block);
        text.split_once(':')
            .map(|(_, rest)| rest)
            .unwrap_or(&text)
            .trim()
            .to_string()
    }

    fn extract_release_date(&self, lines: &[String]) -> Option<chrono::NaiveDate> {
        lines
            .iter()
            .take(RELEASE_LINE_WINDOW)
            .filter(|line| self.release_line.is_match(line))
            .find_map(|line| self.extractor.extract(line))
            .or_else(|| self.extractor.extract(&lines.join(" ")))
    }

    fn clean_line(&self, line: &str) -> String {
        self.line_prefix.replace(line.trim(), "").trim().to_string()
    }

    /// First genre category listed under "About the album"
    pub fn extract_primary_category(&self, raw_lines: &[String]) -> Option<String> {
        let lines: Vec<String> = raw_lines
            .iter()
            .map(|line| self.clean_line(line))
            .filter(|line| !line.is_empty())
            .collect();

        let Some(about) = lines.iter().position(|line| line.to_lowercase().contains(ABOUT_HEADING)) else {
            trace!("No 'About the album' section");
            return None;
        };
        let window = &lines[about..lines.len().min(about + ABOUT_SECTION_WINDOW)];

        for (index, line) in window.iter().enumerate() {
            let lowered = line.to_lowercase();
            if !lowered.contains("genre") {
                continue;
            }

            let inline = match line.split_once(':') {
                Some((field, value)) => {
                    if field.trim().to_lowercase() != "genre" {
                        continue;
                    }
                    value.split_whitespace().collect::<Vec<_>>().join(" ")
                }
                None => {
                    if !lowered.starts_with("genre") {
                        continue;
                    }
                    line.split_whitespace().skip(1).collect::<Vec<_>>().join(" ")
                }
            };

            let value = if inline.is_empty() {
                self.genre_value_below(&window[index + 1..])?
            } else {
                inline
            };
            return classify_genre(&value);
        }

        trace!("No genre field in 'About the album' section");
        None
    }

    fn genre_value_below(&self, following: &[String]) -> Option<String> {
        for line in following.iter().take(GENRE_VALUE_LOOKAHEAD) {
            let cleaned = self.clean_line(line);
            if cleaned.is_empty() {
                continue;
            }
            if self.next_field.is_match(&cleaned) || cleaned.ends_with(':') {
                return None;
            }
            return Some(cleaned);
        }
        None
    }
}

impl DocumentParser for AlbumDetailParser {
    type Output = Option<AlbumDetails>;

    fn parse_document(&self, html: &Html) -> ParsingResult<Self::Output> {
        Ok(self.parse(html))
    }
}

/// Reduce a genre value to its first category. A value starting with "Classical" keeps
/// that token as written; otherwise the first delimiter present splits it, and with no
/// delimiter the first word is used.
pub fn classify_genre(value: &str) -> Option<String> {
    let value = value.trim();
    if value.to_lowercase().starts_with(CLASSICAL_PREFIX) {
        return value.get(..CLASSICAL_PREFIX.len()).map(str::to_string);
    }

    let first = match GENRE_DELIMITERS.iter().find(|d| value.contains(**d)) {
        Some(delimiter) => value.split(*delimiter).next().unwrap_or_default().trim(),
        None => value.split_whitespace().next().unwrap_or_default(),
    };
    (!first.is_empty()).then(|| first.to_string())
}

/// `HH:MM:SS` to seconds
pub fn hms_to_seconds(hms: &str) -> Option<u32> {
    let mut parts = hms.split(':').map(|p| p.trim().parse::<u32>());
    let (Some(Ok(h)), Some(Ok(m)), Some(Ok(s)), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    Some(h * 3600 + m * 60 + s)
}

//! Listing page parser
//!
//! Turns one label listing page into date-attributed candidates. A link only becomes a
//! candidate when a release-date phrase can be bound to it alone; ambiguous or undated
//! links are dropped without error.

#![allow(clippy::uninlined_format_args)]

use std::collections::HashSet;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};
use url::Url;

use super::markup::{ancestors_inclusive, compile_selector, distinct_item_links, flattened_text, is_item_href, resolve_href};
use super::{ContextualParser, ListingContext};
use crate::domain::{Candidate, ReleaseDateExtractor};
use crate::domain::release_date::standard_extractor;
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

/// Ancestor hops tried when binding a date to a link
pub const DEFAULT_MAX_HOPS: usize = 10;

/// Listing pages fetched per label
pub const LISTING_PAGE_CAP: u32 = 2;

static TRAILING_PAGE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/page/\d+/?$").expect("static regex"));

/// Date attribution for a single link: walk up at most `max_hops` containers and take the
/// first one whose only item link is `album_url` and whose text carries a release phrase.
pub fn resolve_attributed_date(
    link: ElementRef<'_>,
    album_url: &str,
    page_url: &Url,
    extractor: &ReleaseDateExtractor,
    max_hops: usize,
) -> Option<NaiveDate> {
    ancestors_inclusive(link, max_hops).into_iter().find_map(|node| {
        let links = distinct_item_links(node, page_url);
        if links.len() != 1 || !links.contains(album_url) {
            return None;
        }
        extractor.extract(&flattened_text(node))
    })
}

/// Strip a trailing `/page/<n>` segment, keeping query and fragment
pub fn normalize_label_base(url: &Url) -> Url {
    let mut base = url.clone();
    let path = TRAILING_PAGE_SEGMENT.replace(url.path(), "").into_owned();
    base.set_path(&path);
    base
}

/// URL of listing page `page` for a label; page 1 is the bare label path
pub fn build_label_page_url(label_url: &Url, page: u32) -> Url {
    let mut target = label_url.clone();
    let stripped = TRAILING_PAGE_SEGMENT.replace(label_url.path(), "");
    let path = stripped.trim_end_matches('/');
    if page <= 1 {
        target.set_path(path);
    } else {
        target.set_path(&format!("{}/page/{}", path, page));
    }
    target
}

pub struct ListingParser {
    link_selector: Selector,
    extractor: &'static ReleaseDateExtractor,
    max_hops: usize,
}

impl ListingParser {
    pub fn new() -> ParsingResult<Self> {
        Ok(Self {
            link_selector: compile_selector("a[href]")?,
            extractor: standard_extractor(),
            max_hops: DEFAULT_MAX_HOPS,
        })
    }

    /// Candidates on this page whose attributed date falls inside the context range.
    /// Each resolved URL is considered once per page, at its first occurrence.
    pub fn extract_candidates(&self, html: &Html, context: &ListingContext) -> ParsingResult<Vec<Candidate>> {
        let page_url = Url::parse(&context.page_url)
            .map_err(|e| ParsingError::url_resolution_failed(&context.page_url, e, None))?;

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut undated = 0usize;
        let mut out_of_range = 0usize;

        for link in html.select(&self.link_selector) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if !is_item_href(href) {
                continue;
            }
            let Some(album_url) = resolve_href(&page_url, href) else {
                continue;
            };
            if !seen.insert(album_url.clone()) {
                continue;
            }

            let Some(date) = resolve_attributed_date(link, &album_url, &page_url, self.extractor, self.max_hops)
            else {
                undated += 1;
                trace!("No attributable release date for {}", album_url);
                continue;
            };

            if context.range.contains(date) {
                candidates.push(Candidate {
                    album_url,
                    label_name: context.label_name.clone(),
                    listing_release_date: date,
                });
            } else {
                out_of_range += 1;
            }
        }

        debug!(
            "Listing page {} of '{}': {} links, {} candidates, {} undated, {} out of range",
            context.page_number,
            context.label_name,
            seen.len(),
            candidates.len(),
            undated,
            out_of_range
        );

        Ok(candidates)
    }

    /// Whether the page links to page 2 of the same label. An exact path match under the
    /// label base wins; otherwise any href containing `/page/2` counts.
    pub fn has_page_two(&self, html: &Html, label_url: &Url) -> bool {
        let base = normalize_label_base(label_url);
        let base_path = base.path().trim_end_matches('/');
        let Ok(exact) = Regex::new(&format!(r"{}/page/2\b", regex::escape(base_path))) else {
            return false;
        };

        let hrefs: Vec<&str> = html
            .select(&self.link_selector)
            .filter_map(|a| a.value().attr("href"))
            .collect();

        let exact_hit = hrefs
            .iter()
            .filter_map(|href| base.join(href).ok())
            .any(|full| exact.is_match(full.path()));

        exact_hit || hrefs.iter().any(|href| href.contains("/page/2"))
    }
}

impl ContextualParser for ListingParser {
    type Output = Vec<Candidate>;
    type Context = ListingContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        self.extract_candidates(html, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DateRange;
    use crate::infrastructure::parsing::parse_with;
    use rstest::rstest;

    const PAGE: &str = "https://shop.example/us-en/label/acme/download-streaming-albums/42";

    fn january() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        )
    }

    fn parse(markup: &str) -> Vec<Candidate> {
        let context = ListingContext::new(PAGE, "Acme", january());
        parse_with(&ListingParser::new().unwrap(), markup, &context).unwrap()
    }

    #[test]
    fn sibling_tiles_keep_their_own_dates() {
        let candidates = parse(
            r#"<ul>
                <li><a href="/us-en/album/a/1">A</a><p>Released by Acme on Jan 5, 2026</p></li>
                <li><a href="/us-en/album/b/2">B</a><p>Released by Acme on Jan 20, 2026</p></li>
            </ul>"#,
        );

        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].album_url.ends_with("/album/a/1"));
        assert_eq!(candidates[0].listing_release_date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert!(candidates[1].album_url.ends_with("/album/b/2"));
        assert_eq!(candidates[1].listing_release_date, NaiveDate::from_ymd_opt(2026, 1, 20).unwrap());
    }

    #[test]
    fn shared_date_is_never_guessed() {
        // One date phrase in a container holding two different items
        let candidates = parse(
            r#"<div>
                <a href="/us-en/album/a/1">A</a>
                <a href="/us-en/album/b/2">B</a>
                <span>Released on Jan 5, 2026</span>
            </div>"#,
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn out_of_range_and_duplicate_links_are_dropped() {
        let candidates = parse(
            r#"<ul>
                <li><a href="/us-en/album/a/1">A</a><a href="/us-en/album/a/1#cover">A</a>
                    <p>To be released on 1/9/26</p></li>
                <li><a href="/us-en/album/c/3">C</a><p>Released on Feb 2, 2026</p></li>
            </ul>"#,
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].label_name, "Acme");
        assert_eq!(candidates[0].listing_release_date, NaiveDate::from_ymd_opt(2026, 1, 9).unwrap());
    }

    #[test]
    fn hop_limit_bounds_the_walk() {
        let markup = r#"<div><p>Released on Jan 5, 2026</p><div><div><div><a href="/album/a/1">A</a></div></div></div></div>"#;
        let html = Html::parse_document(markup);
        let link = html.select(&compile_selector("a").unwrap()).next().unwrap();
        let page = Url::parse(PAGE).unwrap();
        let album = resolve_href(&page, "/album/a/1").unwrap();

        assert_eq!(resolve_attributed_date(link, &album, &page, standard_extractor(), 3), None);
        assert_eq!(
            resolve_attributed_date(link, &album, &page, standard_extractor(), DEFAULT_MAX_HOPS),
            NaiveDate::from_ymd_opt(2026, 1, 5)
        );
    }

    #[rstest]
    #[case("https://s.example/label/acme/42", 1, "https://s.example/label/acme/42")]
    #[case("https://s.example/label/acme/42", 2, "https://s.example/label/acme/42/page/2")]
    #[case("https://s.example/label/acme/42/page/3/", 2, "https://s.example/label/acme/42/page/2")]
    #[case("https://s.example/label/acme/42/?ssf=1", 2, "https://s.example/label/acme/42/page/2?ssf=1")]
    #[case("https://s.example/label/acme/42/page/2?ssf=1", 1, "https://s.example/label/acme/42?ssf=1")]
    fn builds_page_urls(#[case] label: &str, #[case] page: u32, #[case] expected: &str) {
        let url = Url::parse(label).unwrap();
        assert_eq!(build_label_page_url(&url, page).as_str(), expected);
    }

    #[test]
    fn normalizes_label_base() {
        let url = Url::parse("https://s.example/label/acme/42/page/2?x=1").unwrap();
        assert_eq!(normalize_label_base(&url).as_str(), "https://s.example/label/acme/42?x=1");
    }

    #[rstest]
    #[case(r#"<a href="/label/acme/42/page/2">2</a>"#, true)]
    #[case(r#"<a href="https://s.example/label/acme/42/page/2?x=1">2</a>"#, true)]
    #[case(r#"<a href="/elsewhere/page/2">2</a>"#, true)]
    #[case(r#"<a href="/label/acme/42/page/20">20</a>"#, true)]
    #[case(r#"<a href="/label/acme/42/page/3">3</a>"#, false)]
    #[case("<p>no navigation</p>", false)]
    fn detects_second_page(#[case] nav: &str, #[case] expected: bool) {
        let html = Html::parse_document(&format!("<nav>{}</nav>", nav));
        let label = Url::parse("https://s.example/label/acme/42").unwrap();
        assert_eq!(ListingParser::new().unwrap().has_page_two(&html, &label), expected);
    }
}

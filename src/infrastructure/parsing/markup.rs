//! Tree queries over parsed markup
//!
//! The document is an immutable `scraper::Html` tree with parent links. Everything
//! here is a read-only query on that tree: flattened text, item links below a node,
//! and the bounded chain of ancestors above one.

use std::collections::BTreeSet;

use scraper::{ElementRef, Selector};
use url::Url;

use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

/// Path fragment identifying an item-detail link
pub const ITEM_LINK_MARKER: &str = "/album/";

pub fn compile_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
}

pub fn is_item_href(href: &str) -> bool {
    href.contains(ITEM_LINK_MARKER)
}

/// Resolve `href` against the page URL and drop any fragment
pub fn resolve_href(page_url: &Url, href: &str) -> Option<String> {
    let mut resolved = page_url.join(href.trim()).ok()?;
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

/// Text nodes below `element`, trimmed and joined with single spaces
pub fn flattened_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Non-empty text lines below `element`, one per text node line
pub fn text_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .flat_map(|t| t.trim().split('\n'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Distinct resolved item links inside `element`, the element itself included
pub fn distinct_item_links(element: ElementRef<'_>, page_url: &Url) -> BTreeSet<String> {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "a")
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| is_item_href(href))
        .filter_map(|href| resolve_href(page_url, href))
        .collect()
}

/// `element` followed by up to `max_hops - 1` of its element ancestors
pub fn ancestors_inclusive(element: ElementRef<'_>, max_hops: usize) -> Vec<ElementRef<'_>> {
    let mut chain = Vec::with_capacity(max_hops);
    let mut current = Some(element);
    while let Some(node) = current {
        if chain.len() >= max_hops {
            break;
        }
        chain.push(node);
        current = node.parent().and_then(ElementRef::wrap);
    }
    chain
}

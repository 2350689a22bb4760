//! Markup parsing for listing and album detail pages
//!
//! Parsers work on an already-parsed `scraper::Html`. That tree is not `Send`, so
//! callers parse and extract inside a synchronous scope and only carry owned results
//! across await points.

pub mod album_detail_parser;
pub mod context;
pub mod listing_parser;
pub mod markup;

pub use album_detail_parser::AlbumDetailParser;
pub use context::ListingContext;
pub use listing_parser::{
    LISTING_PAGE_CAP, ListingParser, build_label_page_url, normalize_label_base,
    resolve_attributed_date,
};

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

use scraper::Html;

/// Parser that needs to know where the page came from
pub trait ContextualParser {
    type Output;
    type Context;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output>;
}

/// Parser whose result depends on the document alone
pub trait DocumentParser {
    type Output;

    fn parse_document(&self, html: &Html) -> ParsingResult<Self::Output>;
}

/// Parse raw markup and run a contextual parser on it
pub fn parse_with<P: ContextualParser>(parser: &P, markup: &str, context: &P::Context) -> ParsingResult<P::Output> {
    let html = Html::parse_document(markup);
    parser.parse_with_context(&html, context)
}

/// Parse raw markup and run a document parser on it
pub fn parse_document_with<P: DocumentParser>(parser: &P, markup: &str) -> ParsingResult<P::Output> {
    let html = Html::parse_document(markup);
    parser.parse_document(&html)
}

//! Detail page retrieval for candidates

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{AlbumDetails, Candidate};
use crate::infrastructure::http_client::{FetchError, PageSource};
use crate::infrastructure::parsing::{AlbumDetailParser, parse_document_with};

/// What came back for one candidate's detail page
#[derive(Debug)]
pub enum DetailOutcome {
    Parsed(AlbumDetails),
    /// Page fetched but missing the mandatory fields
    Unparseable,
    Unavailable(FetchError),
}

impl DetailOutcome {
    pub fn details(&self) -> Option<&AlbumDetails> {
        match self {
            Self::Parsed(details) => Some(details),
            Self::Unparseable | Self::Unavailable(_) => None,
        }
    }
}

pub struct DetailFetcher {
    source: Arc<dyn PageSource>,
    parser: AlbumDetailParser,
}

impl DetailFetcher {
    pub fn new(source: Arc<dyn PageSource>, parser: AlbumDetailParser) -> Self {
        Self { source, parser }
    }

    /// Fetch and parse the candidate's detail page. Only cancellation is returned as an
    /// error; every other failure is an outcome the filter rejects.
    pub async fn fetch(&self, candidate: &Candidate) -> Result<DetailOutcome, FetchError> {
        let markup = match self.source.fetch_page(&candidate.album_url).await {
            Ok(markup) => markup,
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!("⚠️ Detail page unavailable: {}", e);
                return Ok(DetailOutcome::Unavailable(e));
            }
        };

        Ok(match parse_document_with(&self.parser, &markup) {
            Ok(Some(details)) => DetailOutcome::Parsed(details),
            Ok(None) => {
                debug!("Detail page {} lacks title/artists or total length", candidate.album_url);
                DetailOutcome::Unparseable
            }
            Err(e) => {
                warn!("⚠️ Detail page {} could not be parsed: {}", candidate.album_url, e);
                DetailOutcome::Unparseable
            }
        })
    }
}

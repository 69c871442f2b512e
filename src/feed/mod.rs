//! External feed ingestion: fetch a syndication document, split it into
//! entries, pull out the fields we display and normalize them into
//! [`FeedItem`] records.
//!
//! The pipeline is stateless. Every call re-fetches and re-derives the whole
//! sequence; caching belongs to the caller (see `service::feed`).

mod extract;
mod fetcher;
mod normalize;

use serde::Serialize;
use thiserror::Error;

use extract::{extract_items, parse_item};
pub use fetcher::FeedClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// Date string exactly as the source wrote it.
    pub published_at: String,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid feed url {url:?}: {reason}")]
    Config { url: String, reason: String },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("feed request cancelled after {elapsed_secs}s")]
    Cancelled { elapsed_secs: u64 },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("feed responded with status {0}")]
    Status(u16),
    #[error("feed request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Per-entry failure. Never leaves the pipeline; the entry is dropped.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unterminated CDATA section at byte {offset}")]
    UnterminatedCdata { offset: usize },
}

/// Runs extraction and normalization over a whole document.
pub fn parse_document(document: &str) -> Vec<FeedItem> {
    let fragments = extract_items(document);
    let total = fragments.len();

    let items: Vec<FeedItem> = fragments
        .into_iter()
        .enumerate()
        .filter_map(|(index, fragment)| match parse_item(fragment) {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::warn!(index, error = %err, "skipping malformed feed entry");
                None
            }
        })
        .collect();

    tracing::debug!(total, parsed = items.len(), "feed document parsed");
    items
}

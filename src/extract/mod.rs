//! Content extraction: title, publication date and paragraph chunks
//!
//! Both extractors work purely on a [`Document`](crate::document::Document)
//! and never fail; missing markup yields an empty title, an absent date or
//! no paragraphs.

mod metadata;
mod segmenter;

pub use metadata::{extract_publishing_date, extract_title, find_date};
pub use segmenter::segment_paragraphs;

use crate::config::{SegmenterConfig, SiteConfig};
use crate::document::Document;
use chrono::NaiveDate;

/// Everything the indexing pipeline needs from one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    /// Text of the first `h1`, empty when the page has none
    pub title: String,
    pub publishing_date: Option<NaiveDate>,
    /// Chunks ready for embedding, in document order
    pub paragraphs: Vec<String>,
}

impl ExtractedContent {
    /// Returns true if there is nothing to index
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

/// Runs the metadata extractor and the segmenter over one parsed page
pub fn extract_content(
    document: &dyn Document,
    site: &SiteConfig,
    segmenter: &SegmenterConfig,
) -> ExtractedContent {
    ExtractedContent {
        title: extract_title(document),
        publishing_date: extract_publishing_date(document, &site.date_marker_class),
        paragraphs: segment_paragraphs(document, segmenter),
    }
}

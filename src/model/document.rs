//! Document-level types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ExtractedPage;

/// All objects extracted from a PDF, indexed by page number.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractedDocument {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Pages keyed by 1-based page number
    pub pages: BTreeMap<u32, ExtractedPage>,
}

impl ExtractedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, page: ExtractedPage) {
        self.pages.insert(page.number, page);
    }

    /// Get a page by number (1-indexed).
    pub fn page(&self, number: u32) -> Option<&ExtractedPage> {
        self.pages.get(&number)
    }

    /// Number of extracted pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Image count per page, for pages that have at least one image.
    pub fn image_counts(&self) -> BTreeMap<u32, usize> {
        self.pages
            .iter()
            .map(|(num, page)| (*num, page.image_count()))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Text of a page (see [`ExtractedPage::text`]).
    pub fn page_text(&self, number: u32) -> Option<String> {
        self.page(number).and_then(ExtractedPage::text)
    }

    /// Text of every page that has text.
    pub fn all_text(&self) -> BTreeMap<u32, String> {
        self.pages
            .iter()
            .filter_map(|(num, page)| page.text().map(|t| (*num, t)))
            .collect()
    }

    pub fn total_images(&self) -> usize {
        self.pages.values().map(ExtractedPage::image_count).sum()
    }

    pub fn total_text_blocks(&self) -> usize {
        self.pages.values().map(|p| p.text_objects().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.values().all(ExtractedPage::is_empty)
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metadata {
    /// PDF version (e.g., "1.7")
    pub pdf_version: String,

    /// Total number of pages in the file
    pub page_count: u32,

    pub title: Option<String>,
    pub author: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    pub encrypted: bool,
}

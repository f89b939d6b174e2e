//! Document-level types.

use super::Page;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A loaded document: its source path and rendered pages in order.
///
/// Documents are immutable once loaded; processing only reads them.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path the document was loaded from
    pub source: PathBuf,

    /// Information about the source file
    pub info: DocumentInfo,

    /// Loaded pages, in document order
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a new empty document for a source path.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            info: DocumentInfo::default(),
            pages: Vec::new(),
        }
    }

    /// Set document information.
    pub fn with_info(mut self, info: DocumentInfo) -> Self {
        self.info = info;
        self
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Number of loaded pages.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&Page> {
        if page_num == 0 {
            return None;
        }
        self.pages.iter().find(|p| p.number() == page_num)
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// File stem used to name output artifacts.
    pub fn stem(&self) -> String {
        file_stem(&self.source)
    }
}

/// File stem of a path, falling back to `"document"`.
pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string())
}

/// Information about a source document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// PDF version from the file header (e.g., "1.7")
    pub pdf_version: Option<String>,

    /// Total number of pages in the source, selected or not
    pub page_count: u32,
}

impl DocumentInfo {
    /// Create info with a PDF version.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            pdf_version: Some(version.into()),
            ..Default::default()
        }
    }
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
pub(crate) fn parse_pdf_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use image::{DynamicImage, RgbImage};

    fn page(index: usize, text: &str) -> Page {
        Page::new(index, DynamicImage::ImageRgb8(RgbImage::new(4, 4)), text)
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new("papers/relativity.pdf");
        assert!(doc.is_empty());
        assert_eq!(doc.page_count(), 0);
        assert_eq!(doc.stem(), "relativity");
    }

    #[test]
    fn test_get_page_by_number() {
        let mut doc = Document::new("a.pdf");
        doc.add_page(page(0, "one"));
        doc.add_page(page(1, "two"));
        assert_eq!(doc.get_page(2).unwrap().text, "two");
        assert!(doc.get_page(0).is_none());
        assert!(doc.get_page(3).is_none());
    }

    #[test]
    fn test_stem_fallback() {
        assert_eq!(file_stem(Path::new("")), "document");
    }

    #[test]
    fn test_parse_pdf_date() {
        let date = parse_pdf_date("D:20240115103045").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);

        let date = parse_pdf_date("D:2024").unwrap();
        assert_eq!(date.month(), 1);
        assert!(parse_pdf_date("D:20").is_none());
    }
}

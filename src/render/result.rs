//! Processing results with per-page reports and statistics.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{DocumentInfo, ExtractedImage};
use crate::region::{RegionFailure, SkippedRegion};

/// Final output of one document: reconciled text plus side artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    /// Source document path
    pub source: PathBuf,

    /// Stem used to name output files
    pub stem: String,

    /// Information about the source document
    pub info: DocumentInfo,

    /// Reconciled text of all pages, in page order
    pub text: String,

    /// Block images written while processing
    pub images: Vec<ExtractedImage>,

    /// Images embedded in the pages, written alongside the Block images
    pub embedded: Vec<ExtractedImage>,

    /// Per-page reports, in page order
    pub pages: Vec<PageReport>,

    /// Aggregated statistics
    pub stats: ExtractionStats,
}

impl DocumentResult {
    /// Number of images written: Block crops plus embedded images.
    pub fn image_count(&self) -> usize {
        self.images.len() + self.embedded.len()
    }

    /// Path of the text file inside `dir`.
    pub fn text_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.txt", self.stem))
    }

    /// Write the reconciled text to `<dir>/<stem>.txt`.
    pub fn write_text(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).map_err(|e| Error::persistence(dir, e))?;
        let path = self.text_path(dir);
        fs::write(&path, &self.text).map_err(|e| Error::persistence(&path, e))?;
        Ok(path)
    }
}

/// What happened on a single page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageReport {
    /// Page number (1-based)
    pub number: u32,

    /// Candidate regions found by the detector
    pub regions_detected: usize,

    /// Regions left after dropping noise
    pub regions_classified: usize,

    /// Regions dropped because another region covers them
    pub regions_suppressed: usize,

    /// Embedded images written for this page
    pub embedded_images: usize,

    /// Regions dropped during recognition
    pub failures: Vec<RegionFailure>,

    /// Recognized regions that were not spliced into the text
    pub skipped: Vec<SkippedRegion>,
}

/// Statistics collected while processing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    /// Total number of pages processed
    pub page_count: u32,

    /// Candidate regions found by the detector
    pub regions_detected: u32,

    /// Equations whose LaTeX was spliced into the text
    pub equations_substituted: u32,

    /// Regions dropped because another region covers them
    pub regions_suppressed: u32,

    /// Block images written to disk
    pub images_extracted: u32,

    /// Embedded page images written to disk
    pub embedded_images: u32,

    /// Image markers spliced into the text
    pub images_substituted: u32,

    /// Recognized regions whose text could not be matched
    pub skipped_substitutions: u32,

    /// Equations dropped because the formula engine failed
    pub recognition_failures: u32,

    /// Blocks dropped because their image could not be written
    pub persistence_failures: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,
}

impl ExtractionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment page count.
    pub fn add_page(&mut self) {
        self.page_count += 1;
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &ExtractionStats) {
        self.page_count += other.page_count;
        self.regions_detected += other.regions_detected;
        self.equations_substituted += other.equations_substituted;
        self.regions_suppressed += other.regions_suppressed;
        self.images_extracted += other.images_extracted;
        self.embedded_images += other.embedded_images;
        self.images_substituted += other.images_substituted;
        self.skipped_substitutions += other.skipped_substitutions;
        self.recognition_failures += other.recognition_failures;
        self.persistence_failures += other.persistence_failures;
        self.word_count += other.word_count;
        self.char_count += other.char_count;
    }
}

//! Recognition engines and per-region recognition.
//!
//! OCR and LaTeX recognition are external, fallible services behind the
//! [`TextRecognizer`] and [`FormulaRecognizer`] traits. They are bundled in a
//! [`RecognitionEngines`] handle that the caller builds once and lends to the
//! pipeline; dropping the handle releases the engines.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use image::DynamicImage;
use regex::Regex;
use serde::Serialize;

use super::labels::{ImageStore, PageLabels};
use crate::error::RecognitionError;
use crate::model::{
    BoundingBox, ExtractedImage, Page, RecognizedRegion, Region, RegionKind, Replacement,
};

/// Default budget for a single recognizer call.
pub const DEFAULT_RECOGNITION_TIMEOUT: Duration = Duration::from_secs(30);

/// Math delimiters a formula engine may wrap its answer in.
const LATEX_DELIMITERS: &str =
    r"(?s)^\s*(?:\$\$(.*)\$\$|\\\[(.*)\\\]|\\\((.*)\\\)|\$(.*)\$)\s*$";

/// Closing delimiter of each capture group of [`LATEX_DELIMITERS`].
const CLOSING_DELIMITERS: [&str; 4] = ["$$", "\\]", "\\)", "$"];

/// Maps an image crop to plain text.
pub trait TextRecognizer: Send + Sync {
    /// Engine name, used in logs.
    fn name(&self) -> &str;

    /// Recognize the text in `image`.
    fn recognize_text(&self, image: &DynamicImage) -> Result<String, RecognitionError>;
}

/// Maps an image crop to LaTeX source.
pub trait FormulaRecognizer: Send + Sync {
    /// Engine name, used in logs.
    fn name(&self) -> &str;

    /// Recognize the formula in `image`.
    fn recognize_latex(&self, image: &DynamicImage) -> Result<String, RecognitionError>;
}

/// Run `f` on a worker thread and wait at most `timeout` for its answer.
///
/// On timeout the worker is abandoned; its late answer is discarded.
pub fn call_with_timeout<T, F>(timeout: Duration, f: F) -> Result<T, RecognitionError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, RecognitionError> + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::Builder::new()
        .name("pagesplice-recognize".to_string())
        .spawn(move || {
            let _ = tx.send(f());
        })
        .map_err(|e| RecognitionError::Failed(format!("cannot start worker: {}", e)))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(RecognitionError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(RecognitionError::Failed(
            "recognizer worker exited without an answer".to_string(),
        )),
    }
}

/// Handle to the OCR and formula engines used for a run.
#[derive(Clone)]
pub struct RecognitionEngines {
    text: Arc<dyn TextRecognizer>,
    formula: Option<Arc<dyn FormulaRecognizer>>,
    timeout: Duration,
    delimiters: Regex,
}

impl RecognitionEngines {
    /// Create a handle with an OCR engine and no formula engine.
    pub fn new<T: TextRecognizer + 'static>(text: T) -> Self {
        Self::from_shared(Arc::new(text))
    }

    /// Create a handle from an already shared OCR engine.
    pub fn from_shared(text: Arc<dyn TextRecognizer>) -> Self {
        Self {
            text,
            formula: None,
            timeout: DEFAULT_RECOGNITION_TIMEOUT,
            delimiters: Regex::new(LATEX_DELIMITERS).expect("valid delimiter pattern"),
        }
    }

    /// Attach a formula engine.
    pub fn with_formula<F: FormulaRecognizer + 'static>(self, formula: F) -> Self {
        self.with_shared_formula(Arc::new(formula))
    }

    /// Attach an already shared formula engine.
    pub fn with_shared_formula(mut self, formula: Arc<dyn FormulaRecognizer>) -> Self {
        self.formula = Some(formula);
        self
    }

    /// Set the per-call budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-call budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether equations can be recognized.
    pub fn has_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// OCR a crop within the time budget.
    pub fn read_text(&self, crop: DynamicImage) -> Result<String, RecognitionError> {
        let engine = Arc::clone(&self.text);
        call_with_timeout(self.timeout, move || engine.recognize_text(&crop))
    }

    /// Recognize a formula crop within the time budget.
    ///
    /// Surrounding math delimiters are removed; an empty answer is an error.
    pub fn read_latex(&self, crop: DynamicImage) -> Result<String, RecognitionError> {
        let engine = self
            .formula
            .as_ref()
            .map(Arc::clone)
            .ok_or(RecognitionError::Unavailable("equation"))?;
        let raw = call_with_timeout(self.timeout, move || engine.recognize_latex(&crop))?;
        let latex = self.strip_delimiters(&raw);
        if latex.is_empty() {
            return Err(RecognitionError::EmptyOutput);
        }
        Ok(latex)
    }

    /// Remove one pair of `$..$`, `$$..$$`, `\[..\]` or `\(..\)` delimiters.
    ///
    /// Only a single pair wrapping the whole answer is removed; text holding
    /// several delimited pieces is kept as it is.
    pub fn strip_delimiters(&self, raw: &str) -> String {
        let inner = self.delimiters.captures(raw).and_then(|caps| {
            caps.iter()
                .skip(1)
                .zip(CLOSING_DELIMITERS)
                .find_map(|(group, closing)| group.map(|m| (m.as_str(), closing)))
        });
        match inner {
            Some((inner, closing)) if !inner.contains(closing) => inner.trim().to_string(),
            _ => raw.trim().to_string(),
        }
    }
}

impl fmt::Debug for RecognitionEngines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognitionEngines")
            .field("text", &self.text.name())
            .field("formula", &self.formula.as_ref().map(|e| e.name()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Step at which a region was given up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// The formula engine failed
    Recognition,
    /// The Block image could not be encoded or written
    Persistence,
}

/// A region dropped during recognition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionFailure {
    /// Region position
    pub bbox: BoundingBox,
    /// Region kind
    pub kind: RegionKind,
    /// Failed step
    pub stage: FailureStage,
    /// Error message
    pub message: String,
}

/// Result of recognizing the regions of one page.
#[derive(Debug, Default)]
pub struct RecognitionOutcome {
    /// Regions with a replacement, in reading order
    pub recognized: Vec<RecognizedRegion>,
    /// Block images written for this page
    pub images: Vec<ExtractedImage>,
    /// Regions given up on
    pub failures: Vec<RegionFailure>,
}

impl RecognitionOutcome {
    /// Number of recognized equations.
    pub fn equation_count(&self) -> usize {
        self.recognized
            .iter()
            .filter(|r| matches!(r.replacement, Replacement::Latex(_)))
            .count()
    }
}

/// Turns classified regions into recognized regions.
///
/// Equations go through the formula engine. Blocks are labelled, encoded
/// as PNG and written to the image store; the label only becomes valid
/// once the file is on disk. Any failure drops that one region.
pub struct RegionRecognizer<'a> {
    engines: &'a RecognitionEngines,
    store: &'a ImageStore,
}

impl<'a> RegionRecognizer<'a> {
    /// Create a recognizer borrowing the run's engines and image store.
    pub fn new(engines: &'a RecognitionEngines, store: &'a ImageStore) -> Self {
        Self { engines, store }
    }

    /// Recognize the classified regions of `page`.
    ///
    /// Regions are processed in reading order and clamped to the page
    /// raster; those with no area on the page and Noise regions are ignored.
    /// Every Block draws a label from `labels`, kept or not, so the page's
    /// label count equals its Block count.
    pub fn recognize(
        &self,
        page: &Page,
        mut regions: Vec<Region>,
        labels: &mut PageLabels,
    ) -> RecognitionOutcome {
        regions.sort_by(|a, b| a.bbox.reading_order(&b.bbox));

        let mut outcome = RecognitionOutcome::default();
        let (width, height) = page.dimensions();

        for region in regions {
            if region.kind == RegionKind::Noise {
                continue;
            }
            let label = (region.kind == RegionKind::Block).then(|| labels.next_label());
            let Some(bbox) = region.bbox.clamp_to(width, height) else {
                log::debug!(
                    "page {}: region {} lies outside the page, ignored",
                    page.number(),
                    region.bbox
                );
                continue;
            };
            let region = Region::with_kind(bbox, region.kind);
            let Some(crop) = page.crop(&bbox) else {
                continue;
            };

            match (region.kind, label) {
                (RegionKind::Equation, _) => match self.engines.read_latex(crop) {
                    Ok(latex) => {
                        log::debug!("page {}: equation {} -> {}", page.number(), bbox, latex);
                        outcome
                            .recognized
                            .push(RecognizedRegion::new(region, Replacement::Latex(latex)));
                    }
                    Err(e) => {
                        log::warn!("page {}: equation {} skipped: {}", page.number(), bbox, e);
                        outcome.failures.push(RegionFailure {
                            bbox,
                            kind: region.kind,
                            stage: FailureStage::Recognition,
                            message: e.to_string(),
                        });
                    }
                },
                (RegionKind::Block, Some(label)) => {
                    match self.extract_block(&label, &crop) {
                        Ok(image) => {
                            let path = image.path.clone().unwrap_or_default();
                            log::debug!("page {}: block {} -> {}", page.number(), bbox, label);
                            outcome.recognized.push(RecognizedRegion::new(
                                region,
                                Replacement::Image { label, path },
                            ));
                            outcome.images.push(image);
                        }
                        Err(e) => {
                            log::error!(
                                "page {}: block {} ({}) not saved: {}",
                                page.number(),
                                bbox,
                                label,
                                e
                            );
                            outcome.failures.push(RegionFailure {
                                bbox,
                                kind: region.kind,
                                stage: FailureStage::Persistence,
                                message: e.to_string(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        outcome
    }

    fn extract_block(&self, label: &str, crop: &DynamicImage) -> crate::Result<ExtractedImage> {
        let mut image = ExtractedImage::encode_png(label, crop)?;
        self.store.persist(&mut image)?;
        Ok(image)
    }
}

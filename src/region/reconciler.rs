//! Splicing recognized regions into the baseline text.
//!
//! Each recognized region is matched back to the baseline by OCR-ing its
//! crop and searching for that snippet. Regions are handled in reading
//! order with a moving cursor: a substitution consumes exactly one
//! occurrence, and the search for the next region starts right after the
//! marker just inserted. A region whose snippet is empty or cannot be found
//! leaves the text untouched. No character outside a replaced occurrence is
//! ever altered.
//!
//! Nested or overlapping detections are resolved first with
//! [`suppress_overlapping`], so a glyph inside a figure never competes with
//! the figure for its text.

use image::DynamicImage;
use serde::Serialize;

use super::recognizer::RecognitionEngines;
use crate::model::{crop_image, BoundingBox, RecognizedRegion, RegionKind};

/// One requested substitution: replace `snippet` with `marker`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    /// Text expected in the baseline
    pub snippet: String,
    /// Token to put in its place
    pub marker: String,
}

impl Splice {
    /// Create a splice.
    pub fn new(snippet: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            snippet: snippet.into(),
            marker: marker.into(),
        }
    }
}

/// A substitution that was carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedSplice {
    /// Byte offset of the marker in the output text
    pub offset: usize,
    /// The replaced text
    pub snippet: String,
    /// The inserted marker
    pub marker: String,
}

impl AppliedSplice {
    /// Change in byte length caused by this substitution.
    pub fn length_delta(&self) -> isize {
        self.marker.len() as isize - self.snippet.len() as isize
    }
}

/// Why a region left the text untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The region's own text came back empty
    EmptySnippet,
    /// The region's text does not occur in the rest of the page text
    NotFound {
        /// Searched text
        snippet: String,
    },
    /// OCR of the region failed or timed out
    OcrFailed {
        /// Error message
        message: String,
    },
    /// The region lies inside a higher-priority region
    Overlapped {
        /// The region that won
        by: BoundingBox,
    },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptySnippet => write!(f, "region text is empty"),
            SkipReason::NotFound { snippet } => write!(f, "{:?} not found in page text", snippet),
            SkipReason::OcrFailed { message } => write!(f, "OCR failed: {}", message),
            SkipReason::Overlapped { by } => write!(f, "covered by region {}", by),
        }
    }
}

/// Working text with a cursor past the last substitution.
#[derive(Debug, Clone)]
pub struct Splicer {
    text: String,
    cursor: usize,
}

impl Splicer {
    /// Start from the baseline text.
    pub fn new(baseline: impl Into<String>) -> Self {
        Self {
            text: baseline.into(),
            cursor: 0,
        }
    }

    /// Current working text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the first occurrence of `snippet` at or after the cursor.
    pub fn apply(&mut self, snippet: &str, marker: &str) -> Result<AppliedSplice, SkipReason> {
        if snippet.is_empty() {
            return Err(SkipReason::EmptySnippet);
        }
        let found = self.text[self.cursor..]
            .find(snippet)
            .ok_or_else(|| SkipReason::NotFound {
                snippet: snippet.to_string(),
            })?;

        let start = self.cursor + found;
        self.text.replace_range(start..start + snippet.len(), marker);
        self.cursor = start + marker.len();

        Ok(AppliedSplice {
            offset: start,
            snippet: snippet.to_string(),
            marker: marker.to_string(),
        })
    }

    /// Finish and return the text.
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Rank of a kind when detections overlap.
fn priority(kind: RegionKind) -> u8 {
    match kind {
        RegionKind::Block => 2,
        RegionKind::Equation => 1,
        RegionKind::Noise => 0,
    }
}

/// A region that lost to an overlapping one.
#[derive(Debug, Clone)]
pub struct Suppressed<T> {
    /// The dropped item
    pub item: T,
    /// Box of the region that covers it
    pub by: BoundingBox,
}

/// Resolve nested and overlapping detections.
///
/// Items are ranked Block before Equation before Noise, then by decreasing
/// area. Walking that ranking, an item is dropped when an already kept region
/// contains it, or when a kept Block covers more than half of its area.
/// Kept items come back in reading order.
pub fn suppress_overlapping<T, F>(items: Vec<T>, region_of: F) -> (Vec<T>, Vec<Suppressed<T>>)
where
    F: Fn(&T) -> (BoundingBox, RegionKind),
{
    let mut ranked = items;
    ranked.sort_by(|a, b| {
        let (a_box, a_kind) = region_of(a);
        let (b_box, b_kind) = region_of(b);
        priority(b_kind)
            .cmp(&priority(a_kind))
            .then(b_box.area().cmp(&a_box.area()))
            .then(a_box.reading_order(&b_box))
    });

    let mut kept: Vec<(BoundingBox, RegionKind, T)> = Vec::with_capacity(ranked.len());
    let mut suppressed = Vec::new();
    for item in ranked {
        let (bbox, kind) = region_of(&item);
        let cover = kept.iter().find(|(outer, outer_kind, _)| {
            outer.contains(&bbox)
                || (*outer_kind == RegionKind::Block && outer.overlap_area(&bbox) * 2 > bbox.area())
        });
        match cover {
            Some((by, _, _)) => suppressed.push(Suppressed { item, by: *by }),
            None => kept.push((bbox, kind, item)),
        }
    }

    kept.sort_by(|a, b| a.0.reading_order(&b.0));
    (kept.into_iter().map(|(_, _, item)| item).collect(), suppressed)
}

/// Output of [`splice_text`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpliceResult {
    /// Resulting text
    pub text: String,
    /// Substitutions carried out, in order
    pub applied: Vec<AppliedSplice>,
    /// Indices into the input splices that were skipped, with the reason
    pub skipped: Vec<(usize, SkipReason)>,
}

/// Apply `splices` to `baseline` in the given order.
pub fn splice_text(baseline: &str, splices: &[Splice]) -> SpliceResult {
    let mut splicer = Splicer::new(baseline);
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for (i, splice) in splices.iter().enumerate() {
        match splicer.apply(&splice.snippet, &splice.marker) {
            Ok(done) => applied.push(done),
            Err(reason) => skipped.push((i, reason)),
        }
    }

    SpliceResult {
        text: splicer.into_text(),
        applied,
        skipped,
    }
}

/// A region that left the text untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRegion {
    /// Region position
    pub bbox: BoundingBox,
    /// Region kind
    pub kind: RegionKind,
    /// Why
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Reconciled text of one page plus what happened to each region.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    /// Reconciled page text
    pub text: String,
    /// Applied substitutions, in reading order
    pub applied: Vec<(RegionKind, AppliedSplice)>,
    /// Regions that were not substituted
    pub skipped: Vec<SkippedRegion>,
}

impl ReconcileOutcome {
    /// Number of substitutions of the given kind.
    pub fn applied_count(&self, kind: RegionKind) -> usize {
        self.applied.iter().filter(|(k, _)| *k == kind).count()
    }
}

/// Merges recognized regions into a page's baseline text.
pub struct TextReconciler<'a> {
    engines: &'a RecognitionEngines,
}

impl<'a> TextReconciler<'a> {
    /// Create a reconciler using the run's OCR engine.
    pub fn new(engines: &'a RecognitionEngines) -> Self {
        Self { engines }
    }

    /// Reconcile `baseline` with `regions` found on `page_image`.
    pub fn reconcile(
        &self,
        baseline: &str,
        regions: &[RecognizedRegion],
        page_image: &DynamicImage,
    ) -> ReconcileOutcome {
        let (ordered, covered) =
            suppress_overlapping(regions.iter().collect(), |r: &&RecognizedRegion| {
                (*r.bbox(), r.region.kind)
            });

        let mut splicer = Splicer::new(baseline);
        let mut outcome = ReconcileOutcome::default();
        for Suppressed { item, by } in covered {
            log::debug!("{} {} covered by {}", item.region.kind, item.bbox(), by);
            outcome.skipped.push(SkippedRegion {
                bbox: *item.bbox(),
                kind: item.region.kind,
                reason: SkipReason::Overlapped { by },
            });
        }

        for region in ordered {
            let bbox = *region.bbox();
            let kind = region.region.kind;
            let result = self
                .region_text(&bbox, page_image)
                .and_then(|snippet| splicer.apply(&snippet, &region.marker()));

            match result {
                Ok(done) => {
                    log::debug!("{} {} -> {}", kind, bbox, done.marker);
                    outcome.applied.push((kind, done));
                }
                Err(reason) => {
                    log::debug!("{} {} left untouched: {}", kind, bbox, reason);
                    outcome.skipped.push(SkippedRegion { bbox, kind, reason });
                }
            }
        }

        outcome.text = splicer.into_text();
        outcome
    }

    fn region_text(&self, bbox: &BoundingBox, page_image: &DynamicImage) -> Result<String, SkipReason> {
        let crop = crop_image(page_image, bbox).ok_or(SkipReason::EmptySnippet)?;
        match self.engines.read_text(crop) {
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) => Err(SkipReason::OcrFailed {
                message: e.to_string(),
            }),
        }
    }
}

//! Region reconciliation.
//!
//! A page goes through four stages:
//!
//! 1. [`RegionDetector`] finds candidate rectangles on the raster.
//! 2. [`RegionClassifier`] gives each one a single kind and drops noise;
//!    [`suppress_overlapping`] then drops regions nested in another.
//! 3. [`RegionRecognizer`] turns equations into LaTeX and blocks into
//!    labelled image files.
//! 4. [`TextReconciler`] splices the results into the baseline text.

mod classifier;
mod command;
mod detector;
mod labels;
mod recognizer;
mod reconciler;

pub use classifier::RegionClassifier;
pub use command::{CommandRecognizer, INPUT_PLACEHOLDER};
pub use detector::RegionDetector;
pub use labels::{ImageLabeler, ImageStore, PageLabels};
pub use recognizer::{
    call_with_timeout, FailureStage, FormulaRecognizer, RecognitionEngines, RecognitionOutcome,
    RegionFailure, RegionRecognizer, TextRecognizer, DEFAULT_RECOGNITION_TIMEOUT,
};
pub use reconciler::{
    splice_text, suppress_overlapping, AppliedSplice, ReconcileOutcome, SkipReason,
    SkippedRegion, Splice, SpliceResult, Splicer, Suppressed, TextReconciler,
};

//! Orchestration of whole documents and document sets.

mod batch;
mod document;

pub use batch::{BatchProcessor, BatchSummary, DocumentOutcome, OutcomeStatus, IMAGE_DIR_NAME};
pub use document::{DocumentPipeline, PageRegions};

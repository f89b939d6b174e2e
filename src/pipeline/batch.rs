//! Batch processing of an input directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::document::DocumentPipeline;
use crate::detect::scan_input_dir;
use crate::error::{Error, Result};
use crate::model::file_stem;
use crate::parser::{DocumentLoader, LoadOptions};
use crate::render::{to_json, DocumentResult, ExtractionStats, JsonFormat};

/// Name of the directory, under the output directory, holding images.
pub const IMAGE_DIR_NAME: &str = "images";

/// How a document ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// Text written
    Succeeded,
    /// Load, processing or text output failed
    Failed,
}

/// Per-document entry of a batch summary.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    /// Source document
    pub source: PathBuf,

    /// Outcome
    pub status: OutcomeStatus,

    /// Written text file, on success
    pub output: Option<PathBuf>,

    /// Error message, on failure
    pub error: Option<String>,

    /// Statistics of the document (empty on failure)
    pub stats: ExtractionStats,

    /// Wall time spent on the document
    pub elapsed_ms: u64,
}

impl DocumentOutcome {
    fn succeeded(result: &DocumentResult, output: PathBuf, elapsed_ms: u64) -> Self {
        Self {
            source: result.source.clone(),
            status: OutcomeStatus::Succeeded,
            output: Some(output),
            error: None,
            stats: result.stats.clone(),
            elapsed_ms,
        }
    }

    fn failed(source: &Path, error: &Error, elapsed_ms: u64) -> Self {
        Self {
            source: source.to_path_buf(),
            status: OutcomeStatus::Failed,
            output: None,
            error: Some(error.to_string()),
            stats: ExtractionStats::default(),
            elapsed_ms,
        }
    }

    /// True when the document's text was written.
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}

/// Result of a whole batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub finished_at: DateTime<Utc>,

    /// One entry per input document, in processing order
    pub documents: Vec<DocumentOutcome>,

    /// True when a fatal error stopped the run before every input was tried
    pub aborted: bool,

    /// Statistics summed over successful documents
    pub totals: ExtractionStats,
}

impl BatchSummary {
    /// Number of documents processed successfully.
    pub fn succeeded(&self) -> usize {
        self.documents.iter().filter(|d| d.is_success()).count()
    }

    /// Number of documents that failed.
    pub fn failed(&self) -> usize {
        self.documents.len() - self.succeeded()
    }

    /// True when at least one document failed.
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Serialize the summary to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        to_json(self, format)
    }

    /// Write the summary as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json(JsonFormat::Pretty)?;
        fs::write(path, json).map_err(|e| Error::persistence(path, e))
    }
}

/// Processes every document of an input set, one after another.
///
/// A failing document is recorded in the summary and the run moves on,
/// unless the error is fatal (see [`Error::is_fatal`]). Inputs whose output
/// names collide, compared without case, fail after the first one.
pub struct BatchProcessor<L> {
    loader: L,
    pipeline: DocumentPipeline,
    options: LoadOptions,
}

impl<L: DocumentLoader> BatchProcessor<L> {
    /// Create a batch processor.
    pub fn new(loader: L, pipeline: DocumentPipeline) -> Self {
        Self {
            loader,
            pipeline,
            options: LoadOptions::default(),
        }
    }

    /// Set the options used to load each document.
    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// The document pipeline.
    pub fn pipeline(&self) -> &DocumentPipeline {
        &self.pipeline
    }

    /// Image directory of a document: `<output>/images/<stem>`.
    pub fn image_dir(output_dir: &Path, stem: &str) -> PathBuf {
        output_dir.join(IMAGE_DIR_NAME).join(stem)
    }

    /// Process every PDF in `input_dir`.
    ///
    /// Fails only when the directories themselves are unusable.
    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchSummary> {
        let files = scan_input_dir(input_dir)?;
        self.prepare_output(output_dir)?;
        log::info!("found {} documents in {}", files.len(), input_dir.display());
        Ok(self.run_files(&files, output_dir, |_| {}))
    }

    /// Process the given files, reporting each outcome to `on_done`.
    pub fn run_files<F>(&self, files: &[PathBuf], output_dir: &Path, mut on_done: F) -> BatchSummary
    where
        F: FnMut(&DocumentOutcome),
    {
        let started_at = Utc::now();
        let mut documents = Vec::with_capacity(files.len());
        let mut totals = ExtractionStats::new();
        let mut claimed: HashMap<String, &Path> = HashMap::new();
        let mut aborted = false;

        for path in files {
            let started = Instant::now();
            let stem = file_stem(path);
            let key = stem.to_lowercase();
            let result = match claimed.get(&key) {
                Some(first) => Err(Error::OutputCollision {
                    path: path.clone(),
                    first: first.to_path_buf(),
                    stem,
                }),
                None => {
                    claimed.insert(key, path.as_path());
                    self.process_file(path, output_dir)
                }
            };

            let outcome = match result {
                Ok((result, output)) => {
                    totals.merge(&result.stats);
                    DocumentOutcome::succeeded(&result, output, elapsed_ms(started))
                }
                Err(e) => {
                    log::error!("{}: {}", path.display(), e);
                    aborted = e.is_fatal();
                    DocumentOutcome::failed(path, &e, elapsed_ms(started))
                }
            };
            on_done(&outcome);
            documents.push(outcome);
            if aborted {
                log::error!(
                    "stopping after {} of {} documents",
                    documents.len(),
                    files.len()
                );
                break;
            }
        }

        BatchSummary {
            started_at,
            finished_at: Utc::now(),
            documents,
            aborted,
            totals,
        }
    }

    /// Load, process and write one document.
    pub fn process_file(&self, path: &Path, output_dir: &Path) -> Result<(DocumentResult, PathBuf)> {
        let document = self.loader.load(path, &self.options)?;
        let image_dir = Self::image_dir(output_dir, &document.stem());
        let result = self.pipeline.process(&document, &image_dir);
        let output = result.write_text(output_dir)?;
        Ok((result, output))
    }

    fn prepare_output(&self, output_dir: &Path) -> Result<()> {
        fs::create_dir_all(output_dir).map_err(|e| {
            Error::Configuration(format!(
                "cannot create output directory {}: {}",
                output_dir.display(),
                e
            ))
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

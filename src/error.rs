//! Error types for pagesplice.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for pagesplice operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while processing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The source document could not be opened or rendered.
    #[error("Failed to load document {}: {reason}", path.display())]
    DocumentLoad {
        /// Source path of the document
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// An output artifact could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Persistence {
        /// Target path of the artifact
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Two inputs of a batch would write the same output files.
    #[error("{} has the same output name {stem:?} as {}", path.display(), first.display())]
    OutputCollision {
        /// The input that lost
        path: PathBuf,
        /// The input that claimed the name first
        first: PathBuf,
        /// Shared output stem
        stem: String,
    },

    /// Invalid thresholds, paths or other settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error decoding or encoding raster data.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Error while producing output (text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a [`Error::DocumentLoad`] for the given path.
    pub fn document_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::DocumentLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`Error::Persistence`] for the given path.
    pub fn persistence(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is fatal for the whole run rather than one document.
    /// A batch stops at the first fatal error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON serialization error: {}", err))
    }
}

/// Failure of an external recognition service (OCR or LaTeX) for one region.
///
/// These never abort a page: the affected region is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    /// The engine ran but reported a failure.
    #[error("recognizer failed: {0}")]
    Failed(String),

    /// The engine did not answer within the configured budget.
    #[error("recognizer timed out after {0:?}")]
    Timeout(Duration),

    /// No engine is configured for this region kind.
    #[error("no recognizer available for {0}")]
    Unavailable(&'static str),

    /// The engine returned nothing usable.
    #[error("recognizer returned empty output")]
    EmptyOutput,

    /// The external program could not be started.
    #[error("failed to start recognizer `{program}`: {reason}")]
    Spawn {
        /// Program name
        program: String,
        /// Reason reported by the OS
        reason: String,
    },
}

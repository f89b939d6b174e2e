//! # pagesplice
//!
//! Region reconciliation for rendered PDF pages.
//!
//! Each page arrives as a raster plus its extracted plain text. Equations,
//! figures and tables are found on the raster, recognized (LaTeX for
//! equations, an image file for figures and tables) and spliced back into
//! the text at the place they occupied, leaving the surrounding prose
//! untouched.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagesplice::{CommandRecognizer, PageSplice};
//!
//! fn main() -> pagesplice::Result<()> {
//!     let formula = CommandRecognizer::parse("pix2tex {input}")?;
//!
//!     let summary = PageSplice::from_commands(CommandRecognizer::tesseract(), Some(formula))
//!         .sequential()
//!         .process_dir("papers/", "out/")?;
//!     println!("{} of {} documents done", summary.succeeded(), summary.documents.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Contour-based detection**: binarize, trace, take bounding boxes
//! - **Single classification**: every region is noise, equation or block
//! - **Deterministic splicing**: reading-order substitution with a moving cursor
//! - **Bounded recognition**: every engine call has a timeout
//! - **Parallel pages**: uses Rayon within a document
//! - **Batch driver**: per-document failures never stop the run
//! - **Embedded images**: images placed in the PDF are written alongside

pub mod config;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod region;
pub mod render;

// Re-export commonly used types
pub use config::{ClassifierConfig, DetectorConfig, ImageNumbering, PipelineConfig};
pub use detect::{detect_format_from_bytes, detect_format_from_path, scan_input_dir, PdfFormat};
pub use error::{Error, RecognitionError, Result};
pub use model::{
    BoundingBox, Document, DocumentInfo, ExtractedImage, Page, RecognizedRegion, Region,
    RegionKind, Replacement,
};
#[cfg(feature = "pdfium")]
pub use parser::PdfiumLoader;
pub use parser::{DocumentLoader, ErrorMode, LoadOptions, MemoryLoader, PageSelection};
pub use pipeline::{BatchProcessor, BatchSummary, DocumentOutcome, DocumentPipeline};
pub use region::{
    splice_text, suppress_overlapping, CommandRecognizer, FormulaRecognizer, RecognitionEngines,
    RegionClassifier, RegionDetector, RegionRecognizer, Splice, TextReconciler, TextRecognizer,
};
pub use render::{DocumentResult, ExtractionStats, JsonFormat, PageAssembler};

use std::path::Path;

/// Process an already loaded document.
///
/// Block images are written into `image_dir`.
///
/// # Example
///
/// ```no_run
/// use pagesplice::{process_document, CommandRecognizer, Document, PipelineConfig, RecognitionEngines};
///
/// let engines = RecognitionEngines::new(CommandRecognizer::tesseract());
/// let document = Document::new("paper.pdf");
/// let result = process_document(&document, "out/images", PipelineConfig::default(), &engines)?;
/// println!("{}", result.text);
/// # Ok::<(), pagesplice::Error>(())
/// ```
pub fn process_document<P: AsRef<Path>>(
    document: &Document,
    image_dir: P,
    config: PipelineConfig,
    engines: &RecognitionEngines,
) -> Result<DocumentResult> {
    let pipeline = DocumentPipeline::new(config, engines)?;
    Ok(pipeline.process(document, image_dir.as_ref()))
}

/// Reconcile one page's baseline text with already recognized regions.
///
/// This is the splicing step alone: regions are matched back to the text
/// by OCR-ing their crops, in reading order.
pub fn reconcile_page(
    baseline: &str,
    regions: &[RecognizedRegion],
    page_image: &image::DynamicImage,
    engines: &RecognitionEngines,
) -> String {
    TextReconciler::new(engines)
        .reconcile(baseline, regions, page_image)
        .text
}

/// Builder for configuring and running the pipeline.
///
/// # Example
///
/// ```no_run
/// use pagesplice::{CommandRecognizer, ImageNumbering, PageSplice};
///
/// let result = PageSplice::from_commands(CommandRecognizer::tesseract(), None)
///     .with_numbering(ImageNumbering::Document)
///     .with_dpi(200.0)
///     .lenient()
///     .process_file("paper.pdf", "out/")?;
/// println!("{} images", result.image_count());
/// # Ok::<(), pagesplice::Error>(())
/// ```
pub struct PageSplice {
    config: PipelineConfig,
    load_options: LoadOptions,
    engines: EngineSource,
}

/// Where the builder gets its engines from.
enum EngineSource {
    Ready(RecognitionEngines),
    Commands {
        ocr: CommandRecognizer,
        formula: Option<CommandRecognizer>,
    },
}

impl EngineSource {
    /// Engines for a run whose per-call budget is `timeout`.
    fn build(&self, timeout: std::time::Duration) -> RecognitionEngines {
        match self {
            EngineSource::Ready(engines) => engines.clone(),
            EngineSource::Commands { ocr, formula } => {
                let engines = RecognitionEngines::new(ocr.clone().with_timeout(timeout));
                match formula {
                    Some(formula) => engines.with_formula(formula.clone().with_timeout(timeout)),
                    None => engines,
                }
            }
        }
    }
}

impl PageSplice {
    /// Create a builder around a set of recognition engines.
    ///
    /// The engines are used as given: a [`CommandRecognizer`] inside keeps
    /// its own kill timeout. Use [`PageSplice::from_commands`] to have it
    /// follow [`PageSplice::with_timeout`].
    pub fn new(engines: RecognitionEngines) -> Self {
        Self::with_source(EngineSource::Ready(engines))
    }

    /// Create a builder around external commands.
    ///
    /// Each command is killed once the pipeline's recognition budget runs
    /// out.
    pub fn from_commands(ocr: CommandRecognizer, formula: Option<CommandRecognizer>) -> Self {
        Self::with_source(EngineSource::Commands { ocr, formula })
    }

    fn with_source(engines: EngineSource) -> Self {
        Self {
            config: PipelineConfig::default(),
            load_options: LoadOptions::default(),
            engines,
        }
    }

    /// Replace the whole pipeline configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the image numbering scheme.
    pub fn with_numbering(mut self, numbering: ImageNumbering) -> Self {
        self.config = self.config.with_numbering(numbering);
        self
    }

    /// Set the per-call recognition budget.
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Disable page-level parallelism.
    pub fn sequential(mut self) -> Self {
        self.config = self.config.sequential();
        self
    }

    /// Replace the document load options.
    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.load_options = self.load_options.with_pages(pages);
        self
    }

    /// Set rendering resolution.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.load_options = self.load_options.with_dpi(dpi);
        self
    }

    /// Keep going when single pages cannot be read.
    pub fn lenient(mut self) -> Self {
        self.load_options = self.load_options.lenient();
        self
    }

    /// Leave pages with blank text out of the joined output.
    pub fn skip_empty_pages(mut self) -> Self {
        self.config = self.config.with_skip_empty_pages(true);
        self
    }

    /// Engines the pipeline will run with.
    pub fn engines(&self) -> RecognitionEngines {
        self.engines.build(self.config.recognition_timeout())
    }

    /// Build the document pipeline.
    pub fn pipeline(&self) -> Result<DocumentPipeline> {
        self.load_options.validate()?;
        DocumentPipeline::new(self.config.clone(), &self.engines())
    }

    /// Build a batch processor around `loader`.
    pub fn batch<L: DocumentLoader>(self, loader: L) -> Result<BatchProcessor<L>> {
        let pipeline = self.pipeline()?;
        Ok(BatchProcessor::new(loader, pipeline).with_load_options(self.load_options))
    }

    /// Process a single PDF, writing `<output_dir>/<stem>.txt` and its images.
    #[cfg(feature = "pdfium")]
    pub fn process_file<P: AsRef<Path>, Q: AsRef<Path>>(
        self,
        path: P,
        output_dir: Q,
    ) -> Result<DocumentResult> {
        let batch = self.batch(PdfiumLoader::new()?)?;
        let (result, _) = batch.process_file(path.as_ref(), output_dir.as_ref())?;
        Ok(result)
    }

    /// Process every PDF in `input_dir` into `output_dir`.
    #[cfg(feature = "pdfium")]
    pub fn process_dir<P: AsRef<Path>, Q: AsRef<Path>>(
        self,
        input_dir: P,
        output_dir: Q,
    ) -> Result<BatchSummary> {
        let batch = self.batch(PdfiumLoader::new()?)?;
        batch.run(input_dir.as_ref(), output_dir.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn commands() -> PageSplice {
        PageSplice::from_commands(
            CommandRecognizer::tesseract(),
            Some(CommandRecognizer::new("pix2tex", ["{input}"])),
        )
    }

    #[test]
    fn test_builder_timeout_reaches_engines() {
        let engines = commands().with_timeout(Duration::from_secs(90)).engines();
        assert_eq!(engines.timeout(), Duration::from_secs(90));
        assert!(engines.has_formula());
    }

    #[cfg(unix)]
    #[test]
    fn test_builder_timeout_kills_commands() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let slow = CommandRecognizer::new(
            "sh",
            [
                "-c".to_string(),
                "sleep 1; touch \"$1\"".to_string(),
                "sh".to_string(),
                marker.display().to_string(),
            ],
        );

        let engines = PageSplice::from_commands(slow, None)
            .with_timeout(Duration::from_millis(200))
            .engines();
        let crop = image::DynamicImage::new_rgb8(4, 4);
        assert_eq!(
            engines.read_text(crop),
            Err(RecognitionError::Timeout(Duration::from_millis(200)))
        );

        std::thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }

    #[test]
    fn test_builder_config_flags() {
        let builder = commands()
            .with_numbering(ImageNumbering::Document)
            .skip_empty_pages()
            .sequential();
        let pipeline = builder.pipeline().unwrap();
        assert_eq!(pipeline.config().numbering, ImageNumbering::Document);
        assert!(pipeline.config().skip_empty_pages);
        assert!(!pipeline.config().parallel);
    }

    #[test]
    fn test_builder_rejects_bad_load_options() {
        let result = commands().with_dpi(-1.0).pipeline();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}

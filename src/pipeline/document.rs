//! Per-document orchestration.

use std::path::Path;

use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::model::{Document, ExtractedImage, Page, Region, RegionKind};
use crate::region::{
    suppress_overlapping, FailureStage, ImageLabeler, ImageStore, PageLabels,
    RecognitionEngines, RegionClassifier, RegionDetector, RegionRecognizer, TextReconciler,
};
use crate::render::{DocumentResult, ExtractionStats, PageAssembler, PageReport};

/// Sub-directory of the image directory holding embedded page images.
pub const EMBEDDED_DIR: &str = "embedded";

/// Regions of one page before recognition.
#[derive(Debug, Clone)]
pub struct PageRegions {
    /// Page number (1-based)
    pub number: u32,
    /// Every candidate the detector produced, in scan order
    pub detected: Vec<Region>,
    /// Candidates left after classification and overlap removal, in reading order
    pub classified: Vec<Region>,
    /// Classified regions dropped because another region covers them
    pub suppressed: Vec<Region>,
}

impl PageRegions {
    /// Number of Block regions, which is the number of labels the page uses.
    pub fn block_count(&self) -> usize {
        self.classified
            .iter()
            .filter(|r| r.kind == RegionKind::Block)
            .count()
    }
}

/// Output of one page.
#[derive(Debug)]
struct PageOutput {
    text: String,
    images: Vec<ExtractedImage>,
    embedded: Vec<ExtractedImage>,
    report: PageReport,
    stats: ExtractionStats,
}

/// Runs detection, classification, recognition and reconciliation over
/// every page of a document and assembles the result.
///
/// Pages are independent and are processed in parallel when the
/// configuration allows it. Analysis of every page finishes before any
/// label is handed out, so labels and output follow page order whatever
/// the scheduling.
#[derive(Debug)]
pub struct DocumentPipeline {
    config: PipelineConfig,
    detector: RegionDetector,
    classifier: RegionClassifier,
    engines: RecognitionEngines,
    assembler: PageAssembler,
}

impl DocumentPipeline {
    /// Create a pipeline. The configuration is validated here, before any
    /// document is touched.
    pub fn new(config: PipelineConfig, engines: &RecognitionEngines) -> Result<Self> {
        config.validate()?;
        if !engines.has_formula() {
            log::warn!("no formula engine configured; equations keep their extracted text");
        }
        Ok(Self {
            detector: RegionDetector::with_config(config.detector),
            classifier: RegionClassifier::with_config(config.classifier)?,
            engines: engines.clone().with_timeout(config.recognition_timeout()),
            assembler: PageAssembler::new().skip_empty_pages(config.skip_empty_pages),
            config,
        })
    }

    /// Replace the page assembler.
    pub fn with_assembler(mut self, assembler: PageAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Engines used by this pipeline.
    pub fn engines(&self) -> &RecognitionEngines {
        &self.engines
    }

    /// Detect and classify the regions of a page without recognizing them.
    pub fn analyze_page(&self, page: &Page) -> PageRegions {
        if page.is_degenerate() {
            log::debug!("page {}: empty raster, no regions", page.number());
            return PageRegions {
                number: page.number(),
                detected: Vec::new(),
                classified: Vec::new(),
                suppressed: Vec::new(),
            };
        }

        let detected = self.detector.detect(&page.image);
        let (classified, suppressed) =
            suppress_overlapping(self.classifier.classify_all(detected.clone()), |r: &Region| {
                (r.bbox, r.kind)
            });
        for dropped in &suppressed {
            log::debug!(
                "page {}: {} {} covered by {}",
                page.number(),
                dropped.item.kind,
                dropped.item.bbox,
                dropped.by
            );
        }

        PageRegions {
            number: page.number(),
            detected,
            classified,
            suppressed: suppressed.into_iter().map(|s| s.item).collect(),
        }
    }

    /// Process every page of `document`, writing Block images into
    /// `image_dir` and embedded images into its [`EMBEDDED_DIR`].
    pub fn process(&self, document: &Document, image_dir: &Path) -> DocumentResult {
        let store = ImageStore::new(image_dir);
        let embedded_store = ImageStore::new(image_dir.join(EMBEDDED_DIR));

        let analyzed = self.map_pages(document.pages.iter().collect(), |page| {
            self.analyze_page(page)
        });
        let labels = ImageLabeler::new(self.config.numbering)
            .plan(analyzed.iter().map(|r| (r.number, r.block_count())));

        let work: Vec<(&Page, PageRegions, PageLabels)> = document
            .pages
            .iter()
            .zip(analyzed)
            .zip(labels)
            .map(|((page, regions), labels)| (page, regions, labels))
            .collect();
        let outputs = self.map_pages(work, |(page, regions, mut labels)| {
            self.process_page(page, regions, &mut labels, &store, &embedded_store)
        });

        let text = self.assembler.assemble(outputs.iter().map(|o| o.text.as_str()));
        let mut stats = ExtractionStats::new();
        let mut images = Vec::new();
        let mut embedded = Vec::new();
        let mut pages = Vec::with_capacity(outputs.len());
        for output in outputs {
            stats.merge(&output.stats);
            images.extend(output.images);
            embedded.extend(output.embedded);
            pages.push(output.report);
        }

        log::info!(
            "{}: {} pages, {} equations, {} images, {} embedded, {} skipped",
            document.source.display(),
            stats.page_count,
            stats.equations_substituted,
            stats.images_extracted,
            stats.embedded_images,
            stats.skipped_substitutions
        );

        DocumentResult {
            source: document.source.clone(),
            stem: document.stem(),
            info: document.info.clone(),
            text,
            images,
            embedded,
            pages,
            stats,
        }
    }

    /// Map pages in parallel or in order, keeping page order in the output.
    fn map_pages<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
    {
        if self.config.parallel && items.len() > 1 {
            items.into_par_iter().map(f).collect()
        } else {
            items.into_iter().map(f).collect()
        }
    }

    fn process_page(
        &self,
        page: &Page,
        regions: PageRegions,
        labels: &mut PageLabels,
        store: &ImageStore,
        embedded_store: &ImageStore,
    ) -> PageOutput {
        let regions_detected = regions.detected.len();
        let regions_classified = regions.classified.len();
        let regions_suppressed = regions.suppressed.len();

        let recognition =
            RegionRecognizer::new(&self.engines, store).recognize(page, regions.classified, labels);
        let reconciled =
            TextReconciler::new(&self.engines).reconcile(&page.text, &recognition.recognized, &page.image);
        let (embedded, embedded_failures) = persist_embedded(page, embedded_store);

        let failures_at = |stage: FailureStage| {
            recognition
                .failures
                .iter()
                .filter(|f| f.stage == stage)
                .count() as u32
        };

        let mut stats = ExtractionStats::new();
        stats.add_page();
        stats.regions_detected = regions_detected as u32;
        stats.regions_suppressed = regions_suppressed as u32;
        stats.equations_substituted = reconciled.applied_count(RegionKind::Equation) as u32;
        stats.images_substituted = reconciled.applied_count(RegionKind::Block) as u32;
        stats.images_extracted = recognition.images.len() as u32;
        stats.embedded_images = embedded.len() as u32;
        stats.skipped_substitutions = reconciled.skipped.len() as u32;
        stats.recognition_failures = failures_at(FailureStage::Recognition);
        stats.persistence_failures = failures_at(FailureStage::Persistence) + embedded_failures;
        stats.count_text(&reconciled.text);

        log::debug!(
            "page {}: {} candidates, {} classified, {} suppressed, {} substituted",
            page.number(),
            regions_detected,
            regions_classified,
            regions_suppressed,
            reconciled.applied.len()
        );

        PageOutput {
            text: reconciled.text,
            report: PageReport {
                number: page.number(),
                regions_detected,
                regions_classified,
                regions_suppressed,
                embedded_images: embedded.len(),
                failures: recognition.failures,
                skipped: reconciled.skipped,
            },
            images: recognition.images,
            embedded,
            stats,
        }
    }
}

/// Write the images embedded in `page` as `image_<page>_<n>.png`.
///
/// Returns the written images and the number that could not be written.
fn persist_embedded(page: &Page, store: &ImageStore) -> (Vec<ExtractedImage>, u32) {
    let mut written = Vec::with_capacity(page.embedded.len());
    let mut failed = 0;
    for (i, image) in page.embedded.iter().enumerate() {
        let label = format!("image_{}_{}", page.number(), i + 1);
        let result = ExtractedImage::encode_png(&label, image).and_then(|mut extracted| {
            store.persist(&mut extracted)?;
            Ok(extracted)
        });
        match result {
            Ok(extracted) => written.push(extracted),
            Err(e) => {
                log::warn!("page {}: embedded {} not written: {}", page.number(), label, e);
                failed += 1;
            }
        }
    }
    (written, failed)
}

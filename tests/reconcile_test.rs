//! Integration tests for splicing recognized regions into page text.

use std::collections::HashMap;
use std::path::PathBuf;

use image::{DynamicImage, Rgb, RgbImage};
use pagesplice::region::{SkipReason, TextReconciler};
use pagesplice::{
    reconcile_page, splice_text, BoundingBox, RecognitionEngines, RecognitionError,
    RecognizedRegion, Region, RegionKind, Replacement, Splice, TextRecognizer,
};

/// OCR stub answering by crop width.
struct WidthOcr(HashMap<u32, &'static str>);

impl WidthOcr {
    fn new(answers: &[(u32, &'static str)]) -> Self {
        Self(answers.iter().copied().collect())
    }
}

impl TextRecognizer for WidthOcr {
    fn name(&self) -> &str {
        "width-ocr"
    }

    fn recognize_text(&self, image: &DynamicImage) -> Result<String, RecognitionError> {
        Ok(self.0.get(&image.width()).copied().unwrap_or("").to_string())
    }
}

/// OCR stub that always fails.
struct BrokenOcr;

impl TextRecognizer for BrokenOcr {
    fn name(&self) -> &str {
        "broken"
    }

    fn recognize_text(&self, _image: &DynamicImage) -> Result<String, RecognitionError> {
        Err(RecognitionError::Failed("engine crashed".to_string()))
    }
}

fn page() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(600, 600, Rgb([255, 255, 255])))
}

fn equation(x: u32, y: u32, width: u32, latex: &str) -> RecognizedRegion {
    RecognizedRegion::new(
        Region::with_kind(BoundingBox::new(x, y, width, 30), RegionKind::Equation),
        Replacement::Latex(latex.to_string()),
    )
}

fn block(x: u32, y: u32, width: u32, label: &str) -> RecognizedRegion {
    RecognizedRegion::new(
        Region::with_kind(BoundingBox::new(x, y, width, 120), RegionKind::Block),
        Replacement::Image {
            label: label.to_string(),
            path: PathBuf::from(format!("images/{}.png", label)),
        },
    )
}

#[test]
fn test_zero_regions_leave_text_unchanged() {
    let engines = RecognitionEngines::new(WidthOcr::new(&[]));
    let baseline = "Nothing to see here.\nSecond line.";
    assert_eq!(reconcile_page(baseline, &[], &page(), &engines), baseline);
}

#[test]
fn test_single_equation_substitution() {
    let engines = RecognitionEngines::new(WidthOcr::new(&[(80, "E=mc2")]));
    let regions = [equation(10, 10, 80, "E=mc^2")];

    let text = reconcile_page("intro text E=mc2 more text", &regions, &page(), &engines);
    assert_eq!(text, "intro text $E=mc^2$ more text");
}

#[test]
fn test_only_first_occurrence_replaced() {
    let engines = RecognitionEngines::new(WidthOcr::new(&[(80, "x+y")]));
    let regions = [equation(10, 10, 80, "x + y")];

    let text = reconcile_page("x+y and again x+y", &regions, &page(), &engines);
    assert_eq!(text, "$x + y$ and again x+y");
}

#[test]
fn test_identical_snippets_follow_reading_order() {
    let engines = RecognitionEngines::new(WidthOcr::new(&[(80, "a=b")]));
    // Supplied out of order; the lower region must take the second occurrence.
    let regions = [equation(10, 300, 80, "second"), equation(10, 20, 80, "first")];

    let text = reconcile_page("a=b then a=b again", &regions, &page(), &engines);
    assert_eq!(text, "$first$ then $second$ again");
}

#[test]
fn test_unfound_snippet_is_skipped() {
    let engines = RecognitionEngines::new(WidthOcr::new(&[(80, "zeta"), (300, "Fig. 1")]));
    let regions = [equation(10, 10, 80, "\\zeta"), block(10, 100, 300, "image_1_1")];
    let reconciler = TextReconciler::new(&engines);

    let outcome = reconciler.reconcile("Figure 1 shows the result.", &regions, &page());
    assert_eq!(outcome.text, "Figure 1 shows the result.");
    assert!(outcome.applied.is_empty());
    assert_eq!(outcome.skipped.len(), 2);
    assert_eq!(
        outcome.skipped[0].reason,
        SkipReason::NotFound {
            snippet: "zeta".to_string()
        }
    );
}

#[test]
fn test_reconcile_is_idempotent() {
    let engines = RecognitionEngines::new(WidthOcr::new(&[(80, "E=mc2"), (300, "Plot data")]));
    let regions = [
        equation(10, 10, 80, "E=mc^2"),
        block(10, 100, 300, "image_1_1"),
    ];
    let baseline = "intro E=mc2 text\nPlot data\nend";

    let once = reconcile_page(baseline, &regions, &page(), &engines);
    let twice = reconcile_page(&once, &regions, &page(), &engines);
    assert_eq!(once, "intro $E=mc^2$ text\n[Image image_1_1]\nend");
    assert_eq!(twice, once);
}

#[test]
fn test_ocr_failure_leaves_text_untouched() {
    let engines = RecognitionEngines::new(BrokenOcr);
    let regions = [equation(10, 10, 80, "E=mc^2")];
    let outcome = TextReconciler::new(&engines).reconcile("E=mc2", &regions, &page());

    assert_eq!(outcome.text, "E=mc2");
    assert!(matches!(
        outcome.skipped[0].reason,
        SkipReason::OcrFailed { .. }
    ));
}

#[test]
fn test_splice_text_preserves_surroundings() {
    let baseline = "α before [x] middle [x] after ω";
    let result = splice_text(
        baseline,
        &[
            Splice::new("[x]", "$1$"),
            Splice::new("", "$ignored$"),
            Splice::new("[x]", "$2$"),
            Splice::new("[x]", "$3$"),
        ],
    );

    assert_eq!(result.text, "α before $1$ middle $2$ after ω");
    assert_eq!(result.applied.len(), 2);
    let reasons: Vec<_> = result.skipped.iter().map(|(i, r)| (*i, r.clone())).collect();
    assert_eq!(
        reasons,
        vec![
            (1, SkipReason::EmptySnippet),
            (
                3,
                SkipReason::NotFound {
                    snippet: "[x]".to_string()
                }
            ),
        ]
    );
}

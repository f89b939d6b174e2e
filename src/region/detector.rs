//! Contour-based region detection.
//!
//! The page raster is converted to grayscale, binarized with a fixed
//! threshold (ink becomes foreground), optionally dilated, and traced for
//! contours. Every outer contour yields one candidate region: its
//! axis-aligned bounding rectangle. Candidates are neither merged nor
//! deduplicated here, and come out in the tracer's scan order.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;

use crate::config::DetectorConfig;
use crate::model::{BoundingBox, Region};

const INK: u8 = 255;
const PAPER: u8 = 0;

/// Finds candidate regions on a page raster.
#[derive(Debug, Clone, Default)]
pub struct RegionDetector {
    config: DetectorConfig,
}

impl RegionDetector {
    /// Create a detector with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom settings.
    pub fn with_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Detector settings.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Build the ink mask of a raster: dark pixels become foreground.
    pub fn binarize(&self, image: &DynamicImage) -> GrayImage {
        let gray = image.to_luma8();
        let threshold = self.config.binarize_threshold;
        GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            if gray.get_pixel(x, y)[0] < threshold {
                Luma([INK])
            } else {
                Luma([PAPER])
            }
        })
    }

    /// Detect candidate regions, all of kind Noise.
    ///
    /// An empty or degenerate raster yields no regions.
    pub fn detect(&self, image: &DynamicImage) -> Vec<Region> {
        if image.width() == 0 || image.height() == 0 {
            return Vec::new();
        }

        let mut mask = self.binarize(image);
        if self.config.dilation_radius > 0 {
            mask = dilate(&mask, Norm::L1, self.config.dilation_radius);
        }

        let regions: Vec<Region> = find_contours::<u32>(&mask)
            .into_iter()
            .filter(|contour| matches!(contour.border_type, BorderType::Outer))
            .filter_map(|contour| {
                BoundingBox::enclosing(contour.points.iter().map(|p| (p.x, p.y)))
            })
            .map(Region::new)
            .collect();

        log::debug!(
            "detected {} candidate regions on a {}x{} raster",
            regions.len(),
            image.width(),
            image.height()
        );
        regions
    }
}

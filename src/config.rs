//! Pipeline configuration.
//!
//! All thresholds are configuration rather than constants. A configuration
//! can be built in code with the `with_*` setters or loaded from a JSON file;
//! missing keys fall back to the defaults. [`PipelineConfig::validate`] must
//! pass before any document is processed.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Settings for contour-based region detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Gray level below which a pixel counts as ink (0-255)
    pub binarize_threshold: u8,

    /// Dilation radius applied to the ink mask before tracing contours
    /// (0 disables dilation)
    pub dilation_radius: u8,
}

impl DetectorConfig {
    /// Create detector settings with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the binarization threshold.
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.binarize_threshold = threshold;
        self
    }

    /// Set the dilation radius.
    pub fn with_dilation(mut self, radius: u8) -> Self {
        self.dilation_radius = radius;
        self
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            binarize_threshold: 128,
            dilation_radius: 0,
        }
    }
}

/// Size thresholds separating noise, equations and blocks.
///
/// A region is a Block when it is wider than `block_min_width` and taller
/// than `block_min_height`; otherwise it is an Equation when it is wider
/// than `equation_min_width` and taller than `equation_min_height`;
/// everything else is Noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum (exclusive) width of an equation candidate
    pub equation_min_width: u32,
    /// Minimum (exclusive) height of an equation candidate
    pub equation_min_height: u32,
    /// Minimum (exclusive) width of a figure/table candidate
    pub block_min_width: u32,
    /// Minimum (exclusive) height of a figure/table candidate
    pub block_min_height: u32,
}

impl ClassifierConfig {
    /// Create classifier thresholds with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the equation thresholds.
    pub fn with_equation_min(mut self, width: u32, height: u32) -> Self {
        self.equation_min_width = width;
        self.equation_min_height = height;
        self
    }

    /// Set the block thresholds.
    pub fn with_block_min(mut self, width: u32, height: u32) -> Self {
        self.block_min_width = width;
        self.block_min_height = height;
        self
    }

    /// Check that block thresholds are at least the equation thresholds.
    pub fn validate(&self) -> Result<()> {
        if self.block_min_width < self.equation_min_width
            || self.block_min_height < self.equation_min_height
        {
            return Err(Error::Configuration(format!(
                "block thresholds ({}x{}) must not be smaller than equation thresholds ({}x{})",
                self.block_min_width,
                self.block_min_height,
                self.equation_min_width,
                self.equation_min_height
            )));
        }
        Ok(())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            equation_min_width: 50,
            equation_min_height: 20,
            block_min_width: 200,
            block_min_height: 100,
        }
    }
}

/// How Block images are labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageNumbering {
    /// `image_<page>_<index>`, index restarting at 1 on every page
    #[default]
    Page,
    /// `image_<n>`, n counting across the whole document
    Document,
}

impl std::str::FromStr for ImageNumbering {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "page" => Ok(ImageNumbering::Page),
            "document" | "doc" => Ok(ImageNumbering::Document),
            other => Err(Error::Configuration(format!(
                "unknown image numbering scheme: {}",
                other
            ))),
        }
    }
}

/// Complete configuration of the region-reconciliation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Region detection settings
    pub detector: DetectorConfig,

    /// Region size thresholds
    pub classifier: ClassifierConfig,

    /// Image labelling scheme, fixed for a whole run
    pub numbering: ImageNumbering,

    /// Budget for a single recognizer call, in milliseconds
    pub recognition_timeout_ms: u64,

    /// Process the pages of a document in parallel
    pub parallel: bool,

    /// Leave pages with blank text out of the joined document text
    pub skip_empty_pages: bool,
}

impl PipelineConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| Error::Configuration(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Set detector settings.
    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detector = detector;
        self
    }

    /// Set classifier thresholds.
    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the image numbering scheme.
    pub fn with_numbering(mut self, numbering: ImageNumbering) -> Self {
        self.numbering = numbering;
        self
    }

    /// Set the per-call recognition budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.recognition_timeout_ms = timeout.as_millis().min(u128::from(u64::MAX)) as u64;
        self
    }

    /// Enable or disable page-level parallelism.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Leave blank pages out of the joined text.
    pub fn with_skip_empty_pages(mut self, skip: bool) -> Self {
        self.skip_empty_pages = skip;
        self
    }

    /// Disable page-level parallelism.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Per-call recognition budget.
    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_millis(self.recognition_timeout_ms)
    }

    /// Check the whole configuration.
    pub fn validate(&self) -> Result<()> {
        self.classifier.validate()?;
        if self.recognition_timeout_ms == 0 {
            return Err(Error::Configuration(
                "recognition timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            classifier: ClassifierConfig::default(),
            numbering: ImageNumbering::Page,
            recognition_timeout_ms: 30_000,
            parallel: true,
            skip_empty_pages: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.numbering, ImageNumbering::Page);
        assert_eq!(config.recognition_timeout(), Duration::from_secs(30));
        assert!(config.parallel);
        assert!(!config.skip_empty_pages);
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::new()
            .with_classifier(ClassifierConfig::new().with_equation_min(10, 5))
            .with_detector(DetectorConfig::new().with_threshold(100).with_dilation(2))
            .with_numbering(ImageNumbering::Document)
            .with_timeout(Duration::from_millis(250))
            .with_skip_empty_pages(true)
            .sequential();

        assert_eq!(config.classifier.equation_min_width, 10);
        assert_eq!(config.detector.binarize_threshold, 100);
        assert_eq!(config.detector.dilation_radius, 2);
        assert_eq!(config.numbering, ImageNumbering::Document);
        assert_eq!(config.recognition_timeout_ms, 250);
        assert!(!config.parallel);
        assert!(config.skip_empty_pages);
    }

    #[test]
    fn test_block_smaller_than_equation_rejected() {
        let config = ClassifierConfig::new()
            .with_equation_min(100, 20)
            .with_block_min(50, 200);
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = PipelineConfig::new().with_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_from_json_partial() {
        let config = PipelineConfig::from_json(
            r#"{ "numbering": "document", "classifier": { "block_min_width": 300 } }"#,
        )
        .unwrap();
        assert_eq!(config.numbering, ImageNumbering::Document);
        assert_eq!(config.classifier.block_min_width, 300);
        assert_eq!(config.classifier.block_min_height, 100);
        assert_eq!(config.detector, DetectorConfig::default());
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            PipelineConfig::from_json("{ not json"),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            PipelineConfig::from_json(r#"{ "classifier": { "block_min_width": 1 } }"#),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_numbering_from_str() {
        assert_eq!("page".parse::<ImageNumbering>().unwrap(), ImageNumbering::Page);
        assert_eq!(
            "Document".parse::<ImageNumbering>().unwrap(),
            ImageNumbering::Document
        );
        assert!("chapter".parse::<ImageNumbering>().is_err());
    }
}

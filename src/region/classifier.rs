//! Size-based region classification.

use crate::config::ClassifierConfig;
use crate::error::Result;
use crate::model::{Region, RegionKind};

/// Assigns exactly one [`RegionKind`] to every region.
///
/// Block thresholds are checked first, so a region large enough to be both
/// an equation and a block is a block.
#[derive(Debug, Clone, Default)]
pub struct RegionClassifier {
    config: ClassifierConfig,
}

impl RegionClassifier {
    /// Create a classifier with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with custom thresholds.
    pub fn with_config(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Classifier thresholds.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a region by its dimensions.
    pub fn classify(&self, region: &Region) -> RegionKind {
        let (w, h) = (region.width(), region.height());
        let c = &self.config;
        if w > c.block_min_width && h > c.block_min_height {
            RegionKind::Block
        } else if w > c.equation_min_width && h > c.equation_min_height {
            RegionKind::Equation
        } else {
            RegionKind::Noise
        }
    }

    /// Classify all regions and drop the noise.
    pub fn classify_all(&self, regions: Vec<Region>) -> Vec<Region> {
        let total = regions.len();
        let kept: Vec<Region> = regions
            .into_iter()
            .filter_map(|region| match self.classify(&region) {
                RegionKind::Noise => None,
                kind => Some(Region::with_kind(region.bbox, kind)),
            })
            .collect();
        log::debug!("kept {} of {} regions after classification", kept.len(), total);
        kept
    }
}

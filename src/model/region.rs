//! Region-level types: bounding boxes, kinds and recognized replacements.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

/// Axis-aligned rectangle in page pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box enclosing all given points, or `None` for no points.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut points = points.into_iter();
        let (x0, y0) = points.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
        for (x, y) in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Area in pixels.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// True when the box covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when `other` lies entirely inside this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Area in pixels shared with `other`.
    pub fn overlap_area(&self, other: &BoundingBox) -> u64 {
        let width = self.right().min(other.right()).saturating_sub(self.x.max(other.x));
        let height = self.bottom().min(other.bottom()).saturating_sub(self.y.max(other.y));
        u64::from(width) * u64::from(height)
    }

    /// True when the box is non-empty and inside a `width` x `height` raster.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        !self.is_empty() && self.right() <= width && self.bottom() <= height
    }

    /// Intersect with a `width` x `height` raster; `None` if nothing remains.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let clamped = Self::new(
            self.x,
            self.y,
            self.right().min(width) - self.x,
            self.bottom().min(height) - self.y,
        );
        (!clamped.is_empty()).then_some(clamped)
    }

    /// Reading order: top edge first, then left edge.
    pub fn reading_order(&self, other: &BoundingBox) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Classification of a detected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    /// Prose fragments, glyphs and specks; never recognized
    #[default]
    Noise,
    /// Candidate mathematical equation
    Equation,
    /// Candidate figure or table
    Block,
}

impl std::fmt::Display for RegionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionKind::Noise => write!(f, "noise"),
            RegionKind::Equation => write!(f, "equation"),
            RegionKind::Block => write!(f, "block"),
        }
    }
}

/// A rectangular sub-area of a page suspected of holding non-prose content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Position on the page raster
    pub bbox: BoundingBox,
    /// Assigned kind
    pub kind: RegionKind,
}

impl Region {
    /// Create an unclassified region.
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            kind: RegionKind::Noise,
        }
    }

    /// Create a region with a known kind.
    pub fn with_kind(bbox: BoundingBox, kind: RegionKind) -> Self {
        Self { bbox, kind }
    }

    /// Region width in pixels.
    pub fn width(&self) -> u32 {
        self.bbox.width
    }

    /// Region height in pixels.
    pub fn height(&self) -> u32 {
        self.bbox.height
    }
}

/// What a recognized region is replaced with in the page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Replacement {
    /// Recognized LaTeX source, without math delimiters
    Latex(String),

    /// A persisted figure or table
    Image {
        /// Generated label, e.g. `image_1_2`
        label: String,
        /// Where the image file was written
        path: PathBuf,
    },
}

impl Replacement {
    /// The token spliced into the text for this replacement.
    pub fn marker(&self) -> String {
        match self {
            Replacement::Latex(latex) => format!("${}$", latex),
            Replacement::Image { label, .. } => format!("[Image {}]", label),
        }
    }
}

/// A region together with its recognized replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedRegion {
    /// The source region
    pub region: Region,
    /// Replacement produced by recognition
    pub replacement: Replacement,
}

impl RecognizedRegion {
    /// Pair a region with its replacement.
    pub fn new(region: Region, replacement: Replacement) -> Self {
        Self {
            region,
            replacement,
        }
    }

    /// The region's bounding box.
    pub fn bbox(&self) -> &BoundingBox {
        &self.region.bbox
    }

    /// The token to splice into the text.
    pub fn marker(&self) -> String {
        self.replacement.marker()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_edges_and_area() {
        let bbox = BoundingBox::new(10, 20, 30, 40);
        assert_eq!(bbox.right(), 40);
        assert_eq!(bbox.bottom(), 60);
        assert_eq!(bbox.area(), 1200);
        assert_eq!(bbox.to_string(), "30x40+10+20");
    }

    #[test]
    fn test_bbox_enclosing() {
        let bbox = BoundingBox::enclosing([(5, 7), (9, 3), (6, 10)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(5, 3, 5, 8));
        assert!(BoundingBox::enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn test_bbox_clamp() {
        let bbox = BoundingBox::new(90, 90, 50, 50);
        assert_eq!(bbox.clamp_to(100, 100), Some(BoundingBox::new(90, 90, 10, 10)));
        assert_eq!(bbox.clamp_to(90, 200), None);
        assert!(BoundingBox::new(0, 0, 100, 100).fits_within(100, 100));
        assert!(!BoundingBox::new(0, 0, 101, 100).fits_within(100, 100));
        assert!(!BoundingBox::new(0, 0, 0, 10).fits_within(100, 100));
    }

    #[test]
    fn test_bbox_containment_and_overlap() {
        let frame = BoundingBox::new(10, 10, 300, 200);
        let glyph = BoundingBox::new(50, 60, 80, 30);
        let straddling = BoundingBox::new(300, 10, 40, 20);
        assert!(frame.contains(&glyph));
        assert!(!glyph.contains(&frame));
        assert!(!frame.contains(&straddling));
        assert_eq!(frame.overlap_area(&glyph), glyph.area());
        assert_eq!(frame.overlap_area(&straddling), 10 * 20);
        assert_eq!(frame.overlap_area(&BoundingBox::new(400, 400, 5, 5)), 0);
    }

    #[test]
    fn test_reading_order() {
        let upper_right = BoundingBox::new(80, 10, 5, 5);
        let lower_left = BoundingBox::new(0, 50, 5, 5);
        let upper_left = BoundingBox::new(0, 10, 5, 5);
        let mut boxes = vec![lower_left, upper_right, upper_left];
        boxes.sort_by(|a, b| a.reading_order(b));
        assert_eq!(boxes, vec![upper_left, upper_right, lower_left]);
    }

    #[test]
    fn test_markers() {
        assert_eq!(Replacement::Latex("E=mc^2".into()).marker(), "$E=mc^2$");
        let image = Replacement::Image {
            label: "image_1_1".into(),
            path: PathBuf::from("images/image_1_1.png"),
        };
        assert_eq!(image.marker(), "[Image image_1_1]");
    }
}

//! Page-level types.

use image::DynamicImage;

use super::BoundingBox;

/// A single rendered page with its baseline text.
///
/// Pages are created once when a document is loaded and are read-only
/// afterwards, which lets them be processed on several threads at once.
#[derive(Debug, Clone)]
pub struct Page {
    /// Page index (0-based)
    pub index: usize,

    /// Rendered raster of the page
    pub image: DynamicImage,

    /// Plain text produced by the text extractor, before any substitution
    pub text: String,

    /// Raster images embedded in the page, in content-stream order
    pub embedded: Vec<DynamicImage>,
}

impl Page {
    /// Create a new page.
    pub fn new(index: usize, image: DynamicImage, text: impl Into<String>) -> Self {
        Self {
            index,
            image,
            text: text.into(),
            embedded: Vec::new(),
        }
    }

    /// Attach the images embedded in the page.
    pub fn with_embedded(mut self, embedded: Vec<DynamicImage>) -> Self {
        self.embedded = embedded;
        self
    }

    /// Page number (1-based), as used in image labels.
    pub fn number(&self) -> u32 {
        self.index as u32 + 1
    }

    /// Raster width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Raster height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raster dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// True when the raster has no pixels.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Crop the raster to a region, clamped to the page bounds.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<DynamicImage> {
        crop_image(&self.image, bbox)
    }
}

/// Crop an image to a bounding box, clamped to the image bounds.
pub fn crop_image(image: &DynamicImage, bbox: &BoundingBox) -> Option<DynamicImage> {
    let clamped = bbox.clamp_to(image.width(), image.height())?;
    Some(image.crop_imm(clamped.x, clamped.y, clamped.width, clamped.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
    }

    #[test]
    fn test_page_new() {
        let page = Page::new(0, blank(200, 100), "hello");
        assert_eq!(page.number(), 1);
        assert_eq!(page.dimensions(), (200, 100));
        assert!(!page.is_degenerate());
        assert!(page.embedded.is_empty());
    }

    #[test]
    fn test_page_crop_clamps() {
        let page = Page::new(2, blank(100, 100), "");
        let crop = page.crop(&BoundingBox::new(80, 90, 50, 50)).unwrap();
        assert_eq!((crop.width(), crop.height()), (20, 10));
        assert!(page.crop(&BoundingBox::new(100, 0, 5, 5)).is_none());
    }

    #[test]
    fn test_degenerate_page() {
        let page = Page::new(0, blank(0, 50), "text");
        assert!(page.is_degenerate());
    }

    #[test]
    fn test_page_with_embedded() {
        let page = Page::new(0, blank(10, 10), "").with_embedded(vec![blank(4, 3), blank(2, 2)]);
        assert_eq!(page.embedded.len(), 2);
        assert_eq!(page.embedded[0].width(), 4);
    }
}

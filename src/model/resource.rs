//! Extracted figure and table images.

use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An image cut out of a page for a Block region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// Label used in the text marker and as the file stem
    pub label: String,

    /// Encoded image bytes
    #[serde(skip_serializing, default)]
    pub data: Vec<u8>,

    /// MIME type (e.g., "image/png")
    pub mime_type: String,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Where the image was written, once persisted
    pub path: Option<PathBuf>,
}

impl ExtractedImage {
    /// Encode a crop as PNG.
    pub fn encode_png(label: impl Into<String>, image: &DynamicImage) -> Result<Self> {
        let mut data = Vec::new();
        image.write_to(&mut Cursor::new(&mut data), ImageFormat::Png)?;
        Ok(Self {
            label: label.into(),
            data,
            mime_type: "image/png".to_string(),
            width: image.width(),
            height: image.height(),
            path: None,
        })
    }

    /// File name this image is stored under.
    pub fn filename(&self) -> String {
        format!("{}.{}", self.label, self.extension())
    }

    /// Get the size of the encoded data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        ImageFormat::from_mime_type(&self.mime_type)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("bin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_encode_png() {
        let crop = DynamicImage::ImageRgb8(RgbImage::new(12, 7));
        let img = ExtractedImage::encode_png("image_1_1", &crop).unwrap();
        assert_eq!(img.filename(), "image_1_1.png");
        assert_eq!((img.width, img.height), (12, 7));
        assert_eq!(image::guess_format(&img.data).unwrap(), ImageFormat::Png);
        assert!(img.size() > 0);
        assert!(img.path.is_none());
    }

    #[test]
    fn test_extension_follows_mime_type() {
        let mut img = ExtractedImage::encode_png("image_3", &DynamicImage::new_rgb8(2, 2)).unwrap();
        assert_eq!(img.extension(), "png");
        img.mime_type = "image/jpeg".to_string();
        assert_eq!(img.filename(), "image_3.jpg");
        img.mime_type = "application/x-unknown".to_string();
        assert_eq!(img.extension(), "bin");
    }
}

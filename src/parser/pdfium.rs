//! PDF loading through PDFium.
//!
//! PDFium renders every selected page to a raster and extracts the page's
//! plain text and embedded images through the same document handle.

use std::path::Path;

use image::{DynamicImage, RgbImage};
use pdfium_render::prelude::*;

use super::loader::DocumentLoader;
use super::options::{ErrorMode, LoadOptions};
use crate::detect::detect_format_from_path;
use crate::error::{Error, Result};
use crate::model::{parse_pdf_date, Document, DocumentInfo, Page};

/// Loads PDF documents with a PDFium library bound at construction.
pub struct PdfiumLoader {
    pdfium: Pdfium,
}

impl PdfiumLoader {
    /// Bind PDFium from the working directory, falling back to the system
    /// library.
    pub fn new() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| Error::Configuration(format!("cannot load the PDFium library: {}", e)))?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Bind PDFium from a specific directory.
    pub fn from_library_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
            dir.as_ref(),
        ))
        .map_err(|e| {
            Error::Configuration(format!(
                "cannot load the PDFium library from {}: {}",
                dir.as_ref().display(),
                e
            ))
        })?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    fn render_page(&self, page: &PdfPage, options: &LoadOptions) -> Result<DynamicImage> {
        let (width, height) = options.raster_size(page.width().value, page.height().value);
        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32)
            .render_form_data(true)
            .render_annotations(true);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| Error::Other(format!("render failed: {}", e)))?;
        Ok(bitmap.as_image())
    }

    fn page_text(page: &PdfPage) -> Result<String> {
        let text = page
            .text()
            .map_err(|e| Error::Other(format!("text extraction failed: {}", e)))?;
        Ok(text.all())
    }

    /// Raster images placed on the page. Images PDFium cannot decode are
    /// logged and left out.
    fn embedded_images(page: &PdfPage, number: u32) -> Vec<DynamicImage> {
        page.objects()
            .iter()
            .filter_map(|object| {
                let image = object.as_image_object()?;
                match image.get_raw_image() {
                    Ok(raw) => Some(raw),
                    Err(e) => {
                        log::warn!("page {}: embedded image not decoded: {}", number, e);
                        None
                    }
                }
            })
            .collect()
    }

    fn document_info(document: &PdfDocument, version: String, page_count: u32) -> DocumentInfo {
        let metadata = document.metadata();
        let tag = |kind| {
            metadata
                .get(kind)
                .map(|entry| entry.value().trim().to_string())
                .filter(|value| !value.is_empty())
        };
        DocumentInfo {
            title: tag(PdfDocumentMetadataTagType::Title),
            author: tag(PdfDocumentMetadataTagType::Author),
            created: tag(PdfDocumentMetadataTagType::CreationDate)
                .and_then(|raw| parse_pdf_date(&raw)),
            pdf_version: Some(version),
            page_count,
        }
    }
}

impl DocumentLoader for PdfiumLoader {
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<Document> {
        options.validate()?;
        let format = detect_format_from_path(path)?;

        let pdf = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| Error::document_load(path, e))?;

        let pages = pdf.pages();
        let total = u32::from(pages.len());
        let info = Self::document_info(&pdf, format.version.clone(), total);
        let mut document = Document::new(path).with_info(info);

        for number in options.pages.resolve(total) {
            let index = (number - 1) as usize;
            let page = pages
                .get((number - 1) as PdfPageIndex)
                .map_err(|_| Error::PageOutOfRange(number, total))?;

            let image = match self.render_page(&page, options) {
                Ok(image) => image,
                Err(e) if options.error_mode == ErrorMode::Lenient => {
                    log::warn!("{}: page {} not rendered: {}", path.display(), number, e);
                    DynamicImage::ImageRgb8(RgbImage::new(0, 0))
                }
                Err(e) => return Err(Error::document_load(path, format!("page {}: {}", number, e))),
            };
            let text = match Self::page_text(&page) {
                Ok(text) => text,
                Err(e) if options.error_mode == ErrorMode::Lenient => {
                    log::warn!("{}: page {} has no text: {}", path.display(), number, e);
                    String::new()
                }
                Err(e) => return Err(Error::document_load(path, format!("page {}: {}", number, e))),
            };

            let embedded = if options.extract_embedded {
                Self::embedded_images(&page, number)
            } else {
                Vec::new()
            };

            document.add_page(Page::new(index, image, text).with_embedded(embedded));
        }

        log::info!(
            "loaded {} ({}, {} of {} pages)",
            path.display(),
            format,
            document.page_count(),
            total
        );
        Ok(document)
    }
}

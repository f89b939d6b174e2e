//! Document loader abstraction.
//!
//! A loader turns a source path into a [`Document`]: one rendered raster
//! plus baseline text per selected page. The concrete rendering library
//! stays behind the [`DocumentLoader`] trait.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::options::LoadOptions;
use crate::error::{Error, Result};
use crate::model::Document;

/// Loads documents for the pipeline.
pub trait DocumentLoader {
    /// Load the selected pages of the document at `path`.
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<Document>;
}

impl<L: DocumentLoader + ?Sized> DocumentLoader for &L {
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<Document> {
        (**self).load(path, options)
    }
}

impl<L: DocumentLoader + ?Sized> DocumentLoader for Box<L> {
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<Document> {
        (**self).load(path, options)
    }
}

/// Serves pre-built documents keyed by path.
///
/// Page selection is applied on load, so the same document can be served
/// with different [`LoadOptions`].
#[derive(Debug, Default)]
pub struct MemoryLoader {
    documents: HashMap<PathBuf, Document>,
}

impl MemoryLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under its source path.
    pub fn insert(&mut self, document: Document) {
        self.documents.insert(document.source.clone(), document);
    }

    /// Register a document, builder style.
    pub fn with_document(mut self, document: Document) -> Self {
        self.insert(document);
        self
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when no document is registered.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentLoader for MemoryLoader {
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<Document> {
        options.validate()?;
        let stored = self
            .documents
            .get(path)
            .ok_or_else(|| Error::document_load(path, "no such document"))?;

        let total = stored.page_count();
        let mut document = Document::new(&stored.source).with_info(stored.info.clone());
        for number in options.pages.resolve(total) {
            if let Some(page) = stored.get_page(number) {
                let mut page = page.clone();
                if !options.extract_embedded {
                    page.embedded.clear();
                }
                document.add_page(page);
            }
        }
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Page;
    use crate::parser::PageSelection;
    use image::{DynamicImage, RgbImage};

    fn document(path: &str, pages: usize) -> Document {
        let mut doc = Document::new(path);
        for i in 0..pages {
            doc.add_page(Page::new(
                i,
                DynamicImage::ImageRgb8(RgbImage::new(10, 10)),
                format!("page {}", i + 1),
            ));
        }
        doc
    }

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new().with_document(document("a.pdf", 3));
        let doc = loader.load(Path::new("a.pdf"), &LoadOptions::default()).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(loader.len(), 1);
    }

    #[test]
    fn test_memory_loader_applies_page_selection() {
        let loader = MemoryLoader::new().with_document(document("a.pdf", 5));
        let options = LoadOptions::new().with_pages(PageSelection::Pages(vec![2, 4, 9]));
        let doc = loader.load(Path::new("a.pdf"), &options).unwrap();
        let texts: Vec<_> = doc.pages.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["page 2", "page 4"]);
        assert_eq!(doc.pages[0].index, 1);
    }

    #[test]
    fn test_memory_loader_can_drop_embedded_images() {
        let mut doc = Document::new("a.pdf");
        doc.add_page(
            Page::new(0, DynamicImage::new_rgb8(10, 10), "")
                .with_embedded(vec![DynamicImage::new_rgb8(2, 2)]),
        );
        let loader = MemoryLoader::new().with_document(doc);

        let kept = loader.load(Path::new("a.pdf"), &LoadOptions::default()).unwrap();
        assert_eq!(kept.pages[0].embedded.len(), 1);
        let options = LoadOptions::new().with_embedded_images(false);
        let dropped = loader.load(Path::new("a.pdf"), &options).unwrap();
        assert!(dropped.pages[0].embedded.is_empty());
    }

    #[test]
    fn test_memory_loader_unknown_path() {
        let loader = MemoryLoader::new();
        let result = loader.load(Path::new("missing.pdf"), &LoadOptions::default());
        assert!(matches!(result, Err(Error::DocumentLoad { .. })));
    }

    #[test]
    fn test_loader_through_reference_and_box() {
        let loader = MemoryLoader::new().with_document(document("a.pdf", 1));
        let by_ref: &dyn DocumentLoader = &loader;
        assert!(by_ref.load(Path::new("a.pdf"), &LoadOptions::default()).is_ok());

        let boxed: Box<dyn DocumentLoader> = Box::new(loader);
        assert!(boxed.load(Path::new("a.pdf"), &LoadOptions::default()).is_ok());
    }
}

//! Image labelling and persistence for Block regions.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ImageNumbering;
use crate::error::{Error, Result};
use crate::model::ExtractedImage;

/// Hands out Block image labels for one document.
///
/// With [`ImageNumbering::Page`] each page counts on its own. With
/// [`ImageNumbering::Document`] numbering runs across the document in page
/// order: every page starts after the Blocks of all pages before it, so the
/// labels do not depend on which page finishes first. A label is consumed
/// even if its region is later dropped or its image cannot be written.
#[derive(Debug, Clone, Copy)]
pub struct ImageLabeler {
    numbering: ImageNumbering,
}

impl ImageLabeler {
    /// Create a labeler for a new document.
    pub fn new(numbering: ImageNumbering) -> Self {
        Self { numbering }
    }

    /// Numbering scheme in use.
    pub fn numbering(&self) -> ImageNumbering {
        self.numbering
    }

    /// Labels of one page, given how many Blocks the earlier pages hold.
    pub fn page(&self, page_number: u32, preceding_blocks: usize) -> PageLabels {
        PageLabels {
            numbering: self.numbering,
            page_number,
            preceding_blocks,
            issued: 0,
        }
    }

    /// Label sequences for a whole document.
    ///
    /// `pages` yields `(page number, Block count)` in page order.
    pub fn plan<I>(&self, pages: I) -> Vec<PageLabels>
    where
        I: IntoIterator<Item = (u32, usize)>,
    {
        let mut preceding = 0;
        pages
            .into_iter()
            .map(|(number, blocks)| {
                let labels = self.page(number, preceding);
                preceding += blocks;
                labels
            })
            .collect()
    }
}

/// Label sequence of a single page.
#[derive(Debug, Clone)]
pub struct PageLabels {
    numbering: ImageNumbering,
    page_number: u32,
    preceding_blocks: usize,
    issued: usize,
}

impl PageLabels {
    /// Issue the next label.
    pub fn next_label(&mut self) -> String {
        self.issued += 1;
        match self.numbering {
            ImageNumbering::Page => format!("image_{}_{}", self.page_number, self.issued),
            ImageNumbering::Document => format!("image_{}", self.preceding_blocks + self.issued),
        }
    }

    /// Labels issued on this page so far.
    pub fn issued(&self) -> usize {
        self.issued
    }
}

/// Writes extracted images into an output directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Create a store writing into `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an image and record its path on success.
    pub fn persist(&self, image: &mut ExtractedImage) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::persistence(&self.dir, e))?;
        let path = self.dir.join(image.filename());
        fs::write(&path, &image.data).map_err(|e| Error::persistence(&path, e))?;
        image.path = Some(path.clone());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    #[test]
    fn test_page_scoped_labels() {
        let labeler = ImageLabeler::new(ImageNumbering::Page);
        let mut first = labeler.page(1, 0);
        assert_eq!(first.next_label(), "image_1_1");
        assert_eq!(first.next_label(), "image_1_2");
        let mut third = labeler.page(3, 2);
        assert_eq!(third.next_label(), "image_3_1");
        assert_eq!(first.issued(), 2);
    }

    #[test]
    fn test_document_scoped_labels() {
        let labeler = ImageLabeler::new(ImageNumbering::Document);
        assert_eq!(labeler.page(1, 0).next_label(), "image_1");
        let mut second = labeler.page(2, 1);
        assert_eq!(second.next_label(), "image_2");
        assert_eq!(second.next_label(), "image_3");
    }

    #[test]
    fn test_plan_follows_page_order_whatever_the_issue_order() {
        let labeler = ImageLabeler::new(ImageNumbering::Document);
        let mut plan = labeler.plan([(1, 2), (2, 0), (3, 1), (4, 3)]);

        // Issue from the last page first, as a parallel run might.
        let last: Vec<_> = (0..3).map(|_| plan[3].next_label()).collect();
        let third = plan[2].next_label();
        let first: Vec<_> = (0..2).map(|_| plan[0].next_label()).collect();

        assert_eq!(first, vec!["image_1", "image_2"]);
        assert_eq!(third, "image_3");
        assert_eq!(last, vec!["image_4", "image_5", "image_6"]);
    }

    #[test]
    fn test_plan_with_page_numbering() {
        let labeler = ImageLabeler::new(ImageNumbering::Page);
        let mut plan = labeler.plan([(1, 1), (2, 1)]);
        assert_eq!(plan[1].next_label(), "image_2_1");
        assert_eq!(plan[0].next_label(), "image_1_1");
    }

    #[test]
    fn test_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("images").join("paper"));
        let crop = DynamicImage::ImageRgb8(RgbImage::new(3, 3));
        let mut image = ExtractedImage::encode_png("image_1_1", &crop).unwrap();

        let path = store.persist(&mut image).unwrap();
        assert!(path.ends_with("images/paper/image_1_1.png"));
        assert!(path.exists());
        assert_eq!(image.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_store_failure_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        fs::write(&blocker, b"file, not a directory").unwrap();

        let store = ImageStore::new(&blocker);
        let crop = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let mut image = ExtractedImage::encode_png("image_1", &crop).unwrap();
        let result = store.persist(&mut image);
        assert!(matches!(result, Err(Error::Persistence { .. })));
        assert!(image.path.is_none());
    }
}

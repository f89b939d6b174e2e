//! Document loading options.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// Options for loading documents.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Page selection (which pages to load)
    pub pages: PageSelection,

    /// Rendering resolution in dots per inch
    pub dpi: f32,

    /// Upper bound on either raster dimension, in pixels
    pub max_dimension: u32,

    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Whether to extract the raster images embedded in each page
    pub extract_embedded: bool,
}

impl LoadOptions {
    /// Create new load options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set rendering resolution.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the maximum raster dimension.
    pub fn with_max_dimension(mut self, pixels: u32) -> Self {
        self.max_dimension = pixels;
        self
    }

    /// Enable or disable embedded image extraction.
    pub fn with_embedded_images(mut self, extract: bool) -> Self {
        self.extract_embedded = extract;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (keep going when a page cannot be read).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Check the options.
    pub fn validate(&self) -> Result<()> {
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(Error::Configuration(format!(
                "dpi must be a positive number, got {}",
                self.dpi
            )));
        }
        if self.max_dimension == 0 {
            return Err(Error::Configuration(
                "max_dimension must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Raster size for a page of `width_pt` x `height_pt` points.
    ///
    /// Scales by `dpi / 72` and then shrinks uniformly so that neither side
    /// exceeds `max_dimension`.
    pub fn raster_size(&self, width_pt: f32, height_pt: f32) -> (u32, u32) {
        let scale = self.dpi / 72.0;
        let mut width = (width_pt * scale).max(0.0);
        let mut height = (height_pt * scale).max(0.0);

        let longest = width.max(height);
        let limit = self.max_dimension as f32;
        if longest > limit {
            let ratio = limit / longest;
            width *= ratio;
            height *= ratio;
        }
        (width as u32, height as u32)
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            pages: PageSelection::All,
            dpi: 150.0,
            max_dimension: 4096,
            error_mode: ErrorMode::Strict,
            extract_embedded: true,
        }
    }
}

/// Error handling mode while loading pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// A page that cannot be rendered or read fails the document
    #[default]
    Strict,
    /// Such a page gets empty text (or a blank raster) and is logged
    Lenient,
}

/// Page selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Selected page numbers of a document with `page_count` pages, ascending.
    ///
    /// Pages past the end of the document are ignored.
    pub fn resolve(&self, page_count: u32) -> Vec<u32> {
        (1..=page_count).filter(|p| self.includes(*p)).collect()
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let number = |part: &str| -> Result<u32> {
            match part.trim().parse::<u32>() {
                Ok(0) => Err(Error::InvalidPageRange(
                    "page numbers start at 1".to_string(),
                )),
                Ok(n) => Ok(n),
                Err(_) => Err(Error::InvalidPageRange(format!(
                    "invalid page number: {:?}",
                    part.trim()
                ))),
            }
        };
        let range = |start: &str, end: &str| -> Result<RangeInclusive<u32>> {
            let (start, end) = (number(start)?, number(end)?);
            if start > end {
                return Err(Error::InvalidPageRange(format!(
                    "range {}-{} is reversed",
                    start, end
                )));
            }
            Ok(start..=end)
        };

        // Simple range (e.g., "1-10")
        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                return Ok(PageSelection::Range(range(start, end)?));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            match part.split_once('-') {
                Some((start, end)) => pages.extend(range(start, end)?),
                None => pages.push(number(part)?),
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

impl std::str::FromStr for PageSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PageSelection::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_options_builder() {
        let options = LoadOptions::new()
            .lenient()
            .with_dpi(300.0)
            .with_max_dimension(2000)
            .with_pages(PageSelection::Range(2..=4));

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.dpi, 300.0);
        assert_eq!(options.max_dimension, 2000);
        assert!(options.pages.includes(3));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_default_options() {
        let options = LoadOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.pages, PageSelection::All);
        assert!(options.extract_embedded);
        assert!(!options.clone().with_embedded_images(false).extract_embedded);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_options() {
        assert!(LoadOptions::new().with_dpi(0.0).validate().is_err());
        assert!(LoadOptions::new().with_dpi(f32::NAN).validate().is_err());
        assert!(LoadOptions::new().with_max_dimension(0).validate().is_err());
    }

    #[test]
    fn test_raster_size() {
        // US Letter at 144 dpi.
        let options = LoadOptions::new().with_dpi(144.0);
        assert_eq!(options.raster_size(612.0, 792.0), (1224, 1584));

        let capped = options.with_max_dimension(792);
        assert_eq!(capped.raster_size(612.0, 792.0), (612, 792));
    }

    #[test]
    fn test_page_selection_includes() {
        let all = PageSelection::All;
        assert!(all.includes(1));
        assert!(all.includes(100));

        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));

        let pages = PageSelection::Pages(vec![1, 3, 5, 7]);
        assert!(pages.includes(1));
        assert!(!pages.includes(2));
    }

    #[test]
    fn test_page_selection_resolve() {
        assert_eq!(PageSelection::All.resolve(3), vec![1, 2, 3]);
        assert_eq!(PageSelection::Range(2..=9).resolve(4), vec![2, 3, 4]);
        assert_eq!(PageSelection::Pages(vec![1, 5]).resolve(3), vec![1]);
        assert!(PageSelection::All.resolve(0).is_empty());
    }

    #[test]
    fn test_page_selection_parse() {
        assert_eq!(PageSelection::parse("all").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("").unwrap(), PageSelection::All);
        assert_eq!(
            PageSelection::parse("1-10").unwrap(),
            PageSelection::Range(1..=10)
        );
        assert_eq!(
            PageSelection::parse("7,1,3,5-7,10").unwrap(),
            PageSelection::Pages(vec![1, 3, 5, 6, 7, 10])
        );
    }

    #[test]
    fn test_page_selection_parse_errors() {
        assert!(matches!(
            PageSelection::parse("0"),
            Err(Error::InvalidPageRange(_))
        ));
        assert!(matches!(
            PageSelection::parse("5-2"),
            Err(Error::InvalidPageRange(_))
        ));
        assert!("1,x".parse::<PageSelection>().is_err());
    }
}

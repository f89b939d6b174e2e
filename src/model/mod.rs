//! Document model types.
//!
//! Documents own their pages; regions and recognized regions live only for
//! the duration of one page's reconciliation pass.

mod document;
mod page;
mod region;
mod resource;

pub use document::{Document, DocumentInfo};
pub(crate) use document::{file_stem, parse_pdf_date};
pub use page::{crop_image, Page};
pub use region::{BoundingBox, RecognizedRegion, Region, RegionKind, Replacement};
pub use resource::ExtractedImage;

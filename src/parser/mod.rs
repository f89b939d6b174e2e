//! Document loading.

mod loader;
mod options;
#[cfg(feature = "pdfium")]
mod pdfium;

pub use loader::{DocumentLoader, MemoryLoader};
pub use options::{ErrorMode, LoadOptions, PageSelection};
#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumLoader;

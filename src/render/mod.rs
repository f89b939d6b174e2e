//! Output assembly and reporting.

mod assembler;
mod json;
mod result;

pub use assembler::{PageAssembler, PAGE_SEPARATOR};
pub use json::{to_json, JsonFormat};
pub use result::{DocumentResult, ExtractionStats, PageReport};

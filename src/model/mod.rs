//! Extracted document model.
//!
//! Passive records produced by a single extraction pass: text blocks and
//! image placements, grouped by page.

mod document;
mod image;
mod object;
mod page;

pub use document::{ExtractedDocument, Metadata};
pub use image::ImageFormat;
pub use object::{BBox, ImageObject, PageObject, TextObject, Xref};
pub use page::ExtractedPage;

//! PDF object extraction.
//!
//! Interprets page content streams and classifies what they draw into text
//! blocks and image placements.

pub mod backend;
mod blocks;
mod extractor;
mod layout;
mod matrix;
mod options;

pub use backend::{LopdfBackend, PdfBackend};
pub use blocks::{group_lines_into_blocks, group_spans_into_lines, TextBlock, TextLine};
pub use extractor::{extract_objects, ObjectExtractor};
pub use layout::{ContentInterpreter, ImagePlacement, PageContent, TextSpan};
pub use matrix::Matrix;
pub use options::{ErrorMode, ExtractOptions, PageSelection};

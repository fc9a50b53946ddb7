//! # rulesheet
//!
//! Turn a PDF rulebook into quick-reference cheat sheets.
//!
//! The library walks every page of a rulebook, classifies its content into
//! text blocks and image placements, and renders the result into a plain
//! text sheet, an HTML page with figures, and a PDF. A second toolset splits
//! composite scans of game pieces into one image per piece.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rulesheet::{extract_objects, render};
//!
//! fn main() -> rulesheet::Result<()> {
//!     let doc = extract_objects("rulebook.pdf")?;
//!
//!     for (page, count) in doc.image_counts() {
//!         println!("Page {}: {} image(s)", page, count);
//!     }
//!
//!     let sheet = render::CheatSheet::default();
//!     let options = render::RenderOptions::default();
//!     render::create_cheat_sheet(&doc, &sheet, "cheatsheet.txt", &options)?;
//!     render::create_html_cheatsheet(&doc, &sheet, "cheatsheet.html", &options)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Object extraction**: text blocks with position and font, images in
//!   their original encoding with their placement on the page
//! - **Cheat sheets**: text, HTML and PDF renditions of a data-driven sheet
//! - **Segmentation**: contour and color based piece detection

pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod segment;

// Re-export commonly used types
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_image_file, is_pdf, PdfFormat};
pub use error::{Error, Result};
pub use model::{
    BBox, ExtractedDocument, ExtractedPage, ImageFormat, ImageObject, Metadata, PageObject, TextObject, Xref,
};
pub use parser::{extract_objects, ErrorMode, ExtractOptions, ObjectExtractor, PageSelection};
pub use render::{CheatSheet, CleanupOptions, CleanupPreset, JsonFormat, RenderOptions};
pub use segment::{segment_all_composites, segment_composite_image, SegmentMethod, SegmentOptions};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use render::ImagePaths;

/// Extract objects from a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use rulesheet::{extract_file_with_options, ExtractOptions, PageSelection};
///
/// let options = ExtractOptions::new()
///     .lenient()
///     .with_pages(PageSelection::Range(1..=4));
/// let doc = extract_file_with_options("rulebook.pdf", options).unwrap();
/// ```
pub fn extract_file_with_options<P: AsRef<Path>>(path: P, options: ExtractOptions) -> Result<ExtractedDocument> {
    ObjectExtractor::open(path)?.with_options(options).extract()
}

/// Extract objects from PDF bytes.
pub fn extract_bytes(data: &[u8]) -> Result<ExtractedDocument> {
    ObjectExtractor::from_bytes(data)?.extract()
}

/// Text of every page that has text, keyed by page number.
///
/// # Example
///
/// ```no_run
/// let text = rulesheet::extract_text("rulebook.pdf").unwrap();
/// for (page, text) in text {
///     println!("--- PAGE {} ---\n{}", page, text);
/// }
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<BTreeMap<u32, String>> {
    let options = ExtractOptions::new().text_only();
    Ok(extract_file_with_options(path, options)?.all_text())
}

/// Number of images per page, for pages that have images.
pub fn image_counts<P: AsRef<Path>>(path: P) -> Result<BTreeMap<u32, usize>> {
    Ok(extract_objects(path)?.image_counts())
}

/// Builder for extracting a rulebook and writing its cheat sheets.
///
/// # Example
///
/// ```no_run
/// use rulesheet::Rulesheet;
///
/// let result = Rulesheet::new()
///     .lenient()
///     .with_image_dir("out/cheatsheet_images")
///     .extract("rulebook.pdf")?;
/// result.write_text("out/cheatsheet.txt")?;
/// result.write_html("out/cheatsheet.html")?;
/// # Ok::<(), rulesheet::Error>(())
/// ```
pub struct Rulesheet {
    extract_options: ExtractOptions,
    render_options: RenderOptions,
    sheet: CheatSheet,
}

impl Rulesheet {
    /// Create a builder using the built-in sheet.
    pub fn new() -> Self {
        Self {
            extract_options: ExtractOptions::default(),
            render_options: RenderOptions::default(),
            sheet: CheatSheet::default(),
        }
    }

    /// Enable lenient extraction.
    pub fn lenient(mut self) -> Self {
        self.extract_options = self.extract_options.lenient();
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.extract_options = self.extract_options.with_pages(pages);
        self
    }

    /// Set image output directory.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.render_options = self.render_options.with_image_dir(dir);
        self
    }

    /// Set cleanup preset for the reference text.
    pub fn with_cleanup(mut self, preset: CleanupPreset) -> Self {
        self.render_options = self
            .render_options
            .with_cleanup(CleanupOptions::from_preset(preset));
        self
    }

    /// Replace all render options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Use a different sheet.
    pub fn with_sheet(mut self, sheet: CheatSheet) -> Self {
        self.sheet = sheet;
        self
    }

    /// Extract a PDF file.
    pub fn extract<P: AsRef<Path>>(self, path: P) -> Result<RulesheetResult> {
        let document = extract_file_with_options(path, self.extract_options.clone())?;
        Ok(self.finish(document))
    }

    /// Extract a PDF from bytes.
    pub fn extract_bytes(self, data: &[u8]) -> Result<RulesheetResult> {
        let document = ObjectExtractor::from_bytes(data)?
            .with_options(self.extract_options.clone())
            .extract()?;
        Ok(self.finish(document))
    }

    fn finish(self, document: ExtractedDocument) -> RulesheetResult {
        RulesheetResult {
            document,
            sheet: self.sheet,
            render_options: self.render_options,
        }
    }
}

impl Default for Rulesheet {
    fn default() -> Self {
        Self::new()
    }
}

/// An extracted rulebook, ready to render.
pub struct RulesheetResult {
    /// The extracted objects
    pub document: ExtractedDocument,
    /// The sheet to render
    pub sheet: CheatSheet,
    render_options: RenderOptions,
}

impl RulesheetResult {
    /// Render the plain-text sheet to a string.
    pub fn to_text(&self) -> String {
        render::render_cheat_sheet(&self.document, &self.sheet, &self.render_options)
    }

    /// Convert the extracted objects to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    pub fn write_text<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        render::create_cheat_sheet(&self.document, &self.sheet, path, &self.render_options)
    }

    /// Write the HTML sheet, extracting images into the image directory.
    pub fn write_html<P: AsRef<Path>>(&self, path: P) -> Result<ImagePaths> {
        render::create_html_cheatsheet(&self.document, &self.sheet, path, &self.render_options)
    }

    pub fn write_pdf<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        render::create_pdf_cheatsheet(&self.document, &self.sheet, path, &self.render_options)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        render::write_json(&self.document, path)
    }

    /// Write every image to `dir`.
    pub fn extract_images<P: AsRef<Path>>(&self, dir: P) -> Result<ImagePaths> {
        render::extract_images(&self.document, dir)
    }

    /// Get the document.
    pub fn document(&self) -> &ExtractedDocument {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let builder = Rulesheet::new()
            .lenient()
            .with_pages(PageSelection::Range(1..=5))
            .with_image_dir("img")
            .with_cleanup(CleanupPreset::Standard);

        assert_eq!(builder.extract_options.error_mode, ErrorMode::Lenient);
        assert!(matches!(builder.extract_options.pages, PageSelection::Range(_)));
        assert_eq!(builder.render_options.image_dir, PathBuf::from("img"));
        assert_eq!(
            builder.render_options.cleanup,
            Some(CleanupOptions::standard())
        );
        assert_eq!(builder.sheet, CheatSheet::default());
    }

    #[test]
    fn test_builder_with_sheet() {
        let sheet = CheatSheet::from_json(r#"{"title": "Catan", "sections": []}"#).unwrap();
        let builder = Rulesheet::default().with_sheet(sheet);
        assert_eq!(builder.sheet.title, "Catan");
    }

    #[test]
    fn test_extract_bytes_rejects_non_pdf() {
        assert!(matches!(extract_bytes(b""), Err(Error::UnknownFormat)));
        assert!(matches!(extract_bytes(b"%PDF"), Err(Error::UnknownFormat)));
        assert!(matches!(
            Rulesheet::new().extract_bytes(b"<!DOCTYPE html>"),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_extract_missing_file() {
        assert!(matches!(
            extract_objects("/nonexistent/rulebook.pdf"),
            Err(Error::Io(_))
        ));
    }
}

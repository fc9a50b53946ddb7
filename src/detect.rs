//! Input detection: PDF headers and raster image files.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF header information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extensions (lowercase) that the segmenter treats as image files.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff"];

/// Read the header of `path` and verify that it is a PDF.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let mut header = Vec::with_capacity(16);
    File::open(path)?.take(16).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Verify that `data` starts with a `%PDF-x.y` header.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    let rest = data.strip_prefix(PDF_MAGIC).ok_or(Error::UnknownFormat)?;
    let version = rest.get(..3).ok_or(Error::UnknownFormat)?;
    let version = String::from_utf8_lossy(version).to_string();

    let supported = matches!(version.as_bytes(), [b'1', b'.', minor] if minor.is_ascii_digit())
        || version == "2.0";
    if supported {
        Ok(PdfFormat { version })
    } else {
        Err(Error::UnsupportedVersion(version))
    }
}

/// Check if a file is a readable PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if a path names a raster image the segmenter can process.
pub fn is_image_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

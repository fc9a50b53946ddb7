//! JSON manifest of extracted objects.

use std::path::Path;

use crate::error::{Error, Result};
use crate::model::ExtractedDocument;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert extracted objects to JSON. Image bytes appear as `byte_len`.
pub fn to_json(doc: &ExtractedDocument, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc),
        JsonFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Write the pretty-printed manifest to `path`.
pub fn write_json<P: AsRef<Path>>(doc: &ExtractedDocument, path: P) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, to_json(doc, JsonFormat::Pretty)?)?;
    log::info!("Object manifest written: {}", path.display());
    Ok(())
}

//! Rendering extracted rulebook content into cheat sheet artifacts.

mod cleanup;
mod html;
mod images;
mod json;
mod options;
mod pdf;
pub mod sheet;
mod text;

pub use cleanup::{CleanupOptions, CleanupPipeline, CleanupPreset};
pub use html::{create_html_cheatsheet, escape_html, render_html};
pub use images::{extract_images, image_file_name, ImagePaths};
pub use json::{to_json, write_json, JsonFormat};
pub use options::{RenderOptions, DEFAULT_IMAGE_DIR};
pub use pdf::{create_pdf_cheatsheet, render_pdf};
pub use sheet::{CheatSheet, Item, ListStyle, Section, Table};
pub use text::{create_cheat_sheet, render_cheat_sheet, table_lines};

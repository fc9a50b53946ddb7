//! Writing extracted images to disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::ExtractedDocument;

/// Where each image object was written, keyed by (page number, object index).
pub type ImagePaths = BTreeMap<(u32, usize), PathBuf>;

/// File name for an image: `page{n}_img{idx}.{ext}`.
pub fn image_file_name(page: u32, index: usize, extension: &str) -> String {
    format!("page{}_img{}.{}", page, index, extension)
}

/// Write every image object of `doc` into `output_dir`.
///
/// The directory is created if needed. `idx` in the file name is the
/// object's position within its page, text objects included.
pub fn extract_images<P: AsRef<Path>>(doc: &ExtractedDocument, output_dir: P) -> Result<ImagePaths> {
    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir)?;

    let mut paths = ImagePaths::new();
    for (&number, page) in &doc.pages {
        for (idx, image) in page.image_objects() {
            let filename = image_file_name(number, idx, image.extension());
            let path = output_dir.join(&filename);
            std::fs::write(&path, &image.image_bytes)?;
            log::info!("Extracted: {}", filename);
            paths.insert((number, idx), path);
        }
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, ExtractedPage, ImageObject, TextObject};

    #[test]
    fn test_extract_images_names_by_page_and_index() {
        let mut doc = ExtractedDocument::new();
        let mut page = ExtractedPage::new(3, 612.0, 792.0);
        page.push(TextObject::new("Strongholds", BBox::default(), 11.0, "Times-Roman"));
        page.push(ImageObject::new(vec![0xFF, 0xD8, 0xFF, 0xE0], BBox::default(), (4, 0)));
        page.push(ImageObject::new(b"GIF89a..".to_vec(), BBox::default(), (5, 0)));
        page.push(ImageObject::new(vec![1, 2, 3], BBox::default(), (6, 0)));
        doc.add_page(page);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("images");
        let paths = extract_images(&doc, &out).unwrap();

        let names: Vec<String> = paths
            .values()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["page3_img1.jpg", "page3_img2.gif", "page3_img3.raw"]);
        assert_eq!(std::fs::read(&paths[&(3, 3)]).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_no_images_creates_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("none");
        let paths = extract_images(&ExtractedDocument::new(), &out).unwrap();
        assert!(paths.is_empty());
        assert!(out.is_dir());
    }
}

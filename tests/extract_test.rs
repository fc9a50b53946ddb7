//! Integration tests for object extraction.

mod common;

use rulesheet::{
    extract_bytes, extract_file_with_options, extract_objects, extract_text, image_counts, BBox, Error,
    ExtractOptions, ImageFormat, PageObject, PageSelection,
};

#[test]
fn test_text_blocks_per_page() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rulebook(dir.path());
    let doc = extract_objects(&path).unwrap();

    assert_eq!(doc.page_count(), 3);
    assert_eq!(
        doc.page_text(1).as_deref(),
        Some("Risk Rulebook\nSetup the board\nDeal the cards")
    );
    assert_eq!(doc.page_text(2).as_deref(), Some("Reinforcements"));

    let page1 = doc.page(1).unwrap();
    let blocks: Vec<_> = page1.text_objects().collect();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].font_size, 18.0);
    assert_eq!(blocks[0].font_name, "Helvetica");
    assert_eq!(blocks[1].text, "Setup the board\nDeal the cards");
    assert_eq!(blocks[1].font_size, 11.0);
    assert!(blocks[0].bbox.y1 <= blocks[1].bbox.y0);
}

#[test]
fn test_images_in_content_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rulebook(dir.path());
    let doc = extract_objects(&path).unwrap();

    let page2 = doc.page(2).unwrap();
    assert!(matches!(page2.objects[0], PageObject::Text(_)));
    let image = page2.objects[1].as_image().unwrap();
    assert_eq!(image.format, ImageFormat::Png);
    assert_eq!(image.bbox, BBox::new(72.0, 242.0, 172.0, 292.0));

    let decoded = image::load_from_memory(&image.image_bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (2, 2));
}

#[test]
fn test_unplaced_resource_images_are_appended() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rulebook(dir.path());
    let doc = extract_objects(&path).unwrap();

    let page3 = doc.page(3).unwrap();
    let images: Vec<_> = page3.image_objects().collect();
    assert_eq!(images.len(), 2);

    let (idx, placed) = images[0];
    assert_eq!(idx, 1);
    assert_eq!(placed.format, ImageFormat::Jpeg);
    assert_eq!(placed.bbox, BBox::new(72.0, 312.0, 232.0, 392.0));

    let (idx, unplaced) = images[1];
    assert_eq!(idx, 2);
    assert_eq!(unplaced.bbox, page3.rect());
    assert_ne!(placed.xref, unplaced.xref);
}

#[test]
fn test_image_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rulebook(dir.path());

    let counts = image_counts(&path).unwrap();
    assert_eq!(counts.into_iter().collect::<Vec<_>>(), vec![(2, 1), (3, 2)]);
}

#[test]
fn test_metadata() {
    let doc = extract_bytes(&common::rulebook_pdf()).unwrap();
    assert_eq!(doc.metadata.pdf_version, "1.5");
    assert_eq!(doc.metadata.page_count, 3);
    assert_eq!(doc.metadata.title.as_deref(), Some("Risk Rulebook"));
    assert_eq!(doc.metadata.author.as_deref(), Some("Test Games"));
}

#[test]
fn test_page_selection() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rulebook(dir.path());

    let options = ExtractOptions::new().with_pages(PageSelection::parse("2-3").unwrap());
    let doc = extract_file_with_options(&path, options).unwrap();
    assert_eq!(doc.pages.keys().copied().collect::<Vec<_>>(), vec![2, 3]);
}

#[test]
fn test_text_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rulebook(dir.path());

    let text = extract_text(&path).unwrap();
    assert_eq!(text.len(), 3);
    assert_eq!(text[&3], "Strongholds");

    let doc = extract_file_with_options(&path, ExtractOptions::new().text_only()).unwrap();
    assert_eq!(doc.total_images(), 0);
}

#[test]
fn test_not_a_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.pdf");
    std::fs::write(&path, "just some notes").unwrap();

    assert!(matches!(extract_objects(&path), Err(Error::UnknownFormat)));
    assert!(!rulesheet::is_pdf(&path));
}

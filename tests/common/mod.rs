//! Test fixtures: a small rulebook PDF and composite piece images.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

fn text(x: f32, y: f32, size: f32, s: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::String(s.as_bytes().to_vec(), StringFormat::Literal)]),
        Operation::new("ET", vec![]),
    ]
}

fn place(name: &str, x: f32, y: f32, w: f32, h: f32) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("cm", vec![w.into(), 0i64.into(), 0i64.into(), h.into(), x.into(), y.into()]),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

fn raw_rgb_image(doc: &mut Document, width: u32, height: u32, color: [u8; 3]) -> ObjectId {
    let data: Vec<u8> = (0..width * height).flat_map(|_| color).collect();
    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
        },
        data,
    ))
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 20) as u8, (y * 20) as u8, 90]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    buf
}

fn jpeg_image(doc: &mut Document, width: u32, height: u32) -> ObjectId {
    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
            "Filter" => "DCTDecode",
        },
        jpeg_bytes(width, height),
    );
    stream.allows_compression = false;
    doc.add_object(stream)
}

/// A three page rulebook.
///
/// 1. A heading (18pt) and a two-line paragraph (11pt).
/// 2. "Reinforcements", then a 2x2 raw RGB image drawn at (72, 500), 100x50.
/// 3. "Strongholds", a placed JPEG, and a raw image listed in the
///    resources but never drawn.
pub fn rulebook_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let chart = raw_rgb_image(&mut doc, 2, 2, [200, 30, 30]);
    let figure = jpeg_image(&mut doc, 16, 8);
    let unplaced = raw_rgb_image(&mut doc, 3, 3, [30, 30, 200]);

    let mut page1 = text(72.0, 720.0, 18.0, "Risk Rulebook");
    page1.extend(text(72.0, 690.0, 11.0, "Setup the board"));
    page1.extend(text(72.0, 676.0, 11.0, "Deal the cards"));

    let mut page2 = text(72.0, 720.0, 11.0, "Reinforcements");
    page2.extend(place("Im1", 72.0, 500.0, 100.0, 50.0));

    let mut page3 = text(72.0, 720.0, 11.0, "Strongholds");
    page3.extend(place("Im2", 72.0, 400.0, 160.0, 80.0));

    let pages = [
        (page1, dictionary! {}),
        (page2, dictionary! { "Im1" => chart }),
        (page3, dictionary! { "Im2" => figure, "Im3" => unplaced }),
    ];

    let mut kids: Vec<Object> = Vec::new();
    for (operations, xobjects) in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 3i64,
            "MediaBox" => vec![0i64.into(), 0i64.into(), 612i64.into(), 792i64.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Risk Rulebook"),
        "Author" => Object::string_literal("Test Games"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Write [`rulebook_pdf`] into `dir`.
pub fn write_rulebook(dir: &Path) -> PathBuf {
    let path = dir.join("rulebook.pdf");
    std::fs::write(&path, rulebook_pdf()).unwrap();
    path
}

/// Draw a square piece: an 8px checkerboard of black and dark gray.
pub fn draw_piece(img: &mut RgbImage, x0: u32, y0: u32, size: u32) {
    for y in y0..(y0 + size).min(img.height()) {
        for x in x0..(x0 + size).min(img.width()) {
            let level = if ((x - x0) / 8 + (y - y0) / 8) % 2 == 0 { 0 } else { 100 };
            img.put_pixel(x, y, Rgb([level, level, level]));
        }
    }
}

/// 48px pieces on a 60px pitch over a white canvas.
pub fn composite(width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut y = 6;
    while y + 48 <= height {
        let mut x = 6;
        while x + 48 <= width {
            draw_piece(&mut img, x, y, 48);
            x += 60;
        }
        y += 60;
    }
    img
}

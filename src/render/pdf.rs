//! PDF cheat sheet built with lopdf.
//!
//! Letter-size pages set in the standard Helvetica fonts, so no font data
//! needs embedding. Figures are re-encoded as Flate-compressed RGB.

use std::collections::HashMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::Result;
use crate::model::ExtractedDocument;

use super::sheet::{CheatSheet, Item, ListStyle, Section, Table};
use super::RenderOptions;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 54.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 10.0;
const LEADING: f32 = 1.35;
const INDENT: f32 = 14.0;
const CELL_PADDING: f32 = 4.0;
const MAX_FIGURE_HEIGHT: f32 = 220.0;

/// Average advance of Helvetica glyphs, in ems.
const REGULAR_EM: f32 = 0.52;
const BOLD_EM: f32 = 0.56;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    fn width(&self, text: &str, size: f32) -> f32 {
        let em = match self {
            Font::Regular => REGULAR_EM,
            Font::Bold => BOLD_EM,
        };
        text.chars().count() as f32 * em * size
    }
}

/// An embedded figure.
struct Figure {
    name: String,
    width: u32,
    height: u32,
}

/// A laid out page: its operations and the figures it draws.
#[derive(Default)]
struct PageLayout {
    ops: Vec<Operation>,
    images: Vec<String>,
}

/// Lays out content top to bottom, starting new pages as needed.
struct PageWriter {
    pages: Vec<PageLayout>,
    ops: Vec<Operation>,
    images: Vec<String>,
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            images: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout {
            ops: std::mem::take(&mut self.ops),
            images: std::mem::take(&mut self.images),
        });
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Start a new page unless `height` fits below the cursor.
    fn reserve(&mut self, height: f32) {
        if self.y - height < MARGIN && !self.ops.is_empty() {
            self.new_page();
        }
    }

    fn text(&mut self, x: f32, y: f32, font: Font, size: f32, text: &str) {
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource().into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::String(win_ansi(text), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, width: f32) {
        self.ops.extend([
            Operation::new("w", vec![width.into()]),
            Operation::new("m", vec![x0.into(), y0.into()]),
            Operation::new("l", vec![x1.into(), y1.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, gray: f32) {
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new("g", vec![gray.into()]),
            Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn image(&mut self, name: &str, x: f32, y: f32, w: f32, h: f32) {
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new("cm", vec![w.into(), 0i64.into(), 0i64.into(), h.into(), x.into(), y.into()]),
            Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
        self.images.push(name.to_string());
    }

    /// Write wrapped text at `x`, an optional bold label leading the first line.
    fn paragraph(&mut self, x: f32, label: Option<&str>, text: &str, size: f32) {
        let line_height = size * LEADING;
        let width = PAGE_WIDTH - MARGIN - x;

        let label = label.map(|l| format!("{}: ", l));
        let offset = label.as_deref().map(|l| Font::Bold.width(l, size)).unwrap_or(0.0);
        let lines = wrap(text, Font::Regular, size, width, offset);

        for (i, line) in lines.iter().enumerate() {
            self.reserve(line_height);
            self.y -= line_height;
            let mut line_x = x;
            if i == 0 {
                if let Some(label) = &label {
                    self.text(x, self.y, Font::Bold, size, label);
                    line_x += offset;
                }
            }
            if !line.is_empty() {
                self.text(line_x, self.y, Font::Regular, size, line);
            }
        }
    }

    fn finish(mut self) -> Vec<PageLayout> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        self.pages
    }
}

/// Greedy word wrap; the first line is `first_offset` narrower.
fn wrap(text: &str, font: Font, size: f32, width: f32, first_offset: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let available = if lines.is_empty() { width - first_offset } else { width };
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if font.width(&candidate, size) <= available || current.is_empty() {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines
}

/// Encode text for the WinAnsi-encoded standard fonts.
fn win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => out.push(c as u8),
            '\u{2022}' => out.push(0x95),
            '\u{2013}' => out.push(0x96),
            '\u{2014}' => out.push(0x97),
            '\u{2018}' => out.push(0x91),
            '\u{2019}' => out.push(0x92),
            '\u{201C}' => out.push(0x93),
            '\u{201D}' => out.push(0x94),
            '\u{2026}' => out.push(0x85),
            '\u{2192}' => out.extend_from_slice(b"->"),
            _ => out.push(b'?'),
        }
    }
    out
}

/// Lay out the sheet and assemble the PDF document.
pub fn render_pdf(doc: &ExtractedDocument, sheet: &CheatSheet, options: &RenderOptions) -> Result<Document> {
    let mut pdf = Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let mut xobject_ids: HashMap<String, ObjectId> = HashMap::new();
    let mut figures: Vec<(u32, Figure)> = Vec::new();
    if options.embed_figures {
        for page in sheet.figure_pages() {
            for (figure, id) in embed_page_images(&mut pdf, doc, page)? {
                xobject_ids.insert(figure.name.clone(), id);
                figures.push((page, figure));
            }
        }
    }

    let mut writer = PageWriter::new();
    writer.y -= TITLE_SIZE;
    writer.text(MARGIN, writer.y, Font::Bold, TITLE_SIZE, &sheet.full_title().to_uppercase());
    writer.y -= 8.0;
    writer.line(MARGIN, writer.y, PAGE_WIDTH - MARGIN, writer.y, 1.5);

    for section in &sheet.sections {
        write_section(&mut writer, section);
        if let Some(page) = section.figures {
            let page_figures: Vec<&Figure> = figures
                .iter()
                .filter(|(p, _)| *p == page)
                .map(|(_, f)| f)
                .collect();
            write_figures(&mut writer, &page_figures);
        }
    }

    let font_regular = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let font_bold = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let fonts_id = pdf.add_object(dictionary! {
        Font::Regular.resource() => font_regular,
        Font::Bold.resource() => font_bold,
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in writer.finish() {
        let content = Content { operations: page.ops };
        let content_id = pdf.add_object(Stream::new(dictionary! {}, content.encode()?));

        // only the figures drawn on this page
        let mut xobjects = Dictionary::new();
        for name in &page.images {
            if let Some(id) = xobject_ids.get(name) {
                xobjects.set(name.as_bytes().to_vec(), Object::Reference(*id));
            }
        }
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => fonts_id,
                "XObject" => xobjects,
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0i64.into(), 0i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = pdf.add_object(dictionary! {
        "Title" => Object::string_literal(sheet.full_title()),
        "Producer" => Object::string_literal(concat!("rulesheet ", env!("CARGO_PKG_VERSION"))),
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.trailer.set("Info", info_id);
    pdf.compress();

    Ok(pdf)
}

/// Write the PDF sheet to `output_path`.
pub fn create_pdf_cheatsheet<P: AsRef<Path>>(
    doc: &ExtractedDocument,
    sheet: &CheatSheet,
    output_path: P,
    options: &RenderOptions,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let mut pdf = render_pdf(doc, sheet, options)?;
    let mut file = std::fs::File::create(output_path)?;
    pdf.save_to(&mut file)?;
    log::info!("PDF cheat sheet created: {}", output_path.display());
    Ok(())
}

/// Add the displayable images of `page` as image XObjects.
fn embed_page_images(pdf: &mut Document, doc: &ExtractedDocument, page: u32) -> Result<Vec<(Figure, ObjectId)>> {
    let Some(extracted) = doc.page(page) else {
        return Ok(Vec::new());
    };

    let mut embedded = Vec::new();
    for (idx, image) in extracted.image_objects() {
        if !image.format.is_displayable() {
            continue;
        }
        let rgb = match image::load_from_memory(&image.image_bytes) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                log::warn!("Cannot embed page {} image {}: {}", page, idx, e);
                continue;
            }
        };
        let (width, height) = rgb.dimensions();

        let mut stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
            },
            rgb.into_raw(),
        );
        stream.compress()?;
        let id = pdf.add_object(stream);

        let name = format!("Im{}p{}", page, idx);
        embedded.push((Figure { name, width, height }, id));
    }
    Ok(embedded)
}

fn write_section(writer: &mut PageWriter, section: &Section) {
    let heading_height = HEADING_SIZE * LEADING + 10.0;
    // keep the heading with at least two body lines
    writer.reserve(heading_height + 2.0 * BODY_SIZE * LEADING);
    writer.y -= heading_height;
    writer.text(MARGIN, writer.y, Font::Bold, HEADING_SIZE, &section.heading);
    writer.y -= 3.0;
    writer.line(MARGIN, writer.y, MARGIN + 180.0, writer.y, 0.75);

    let x = MARGIN + INDENT;
    for (i, item) in section.items.iter().enumerate() {
        match section.style {
            ListStyle::Numbered => write_marked(writer, &format!("{}.", i + 1), item, x),
            ListStyle::Bullets => write_marked(writer, "\u{2022}", item, x),
            ListStyle::Plain | ListStyle::Callout => {
                writer.paragraph(x, item.label.as_deref(), &item.text, BODY_SIZE)
            }
        }
        for child in &item.children {
            write_marked(writer, "\u{2022}", child, x + INDENT);
        }
    }

    if let Some(table) = &section.table {
        write_table(writer, table, x);
    }
    for note in &section.notes {
        writer.paragraph(x, note.label.as_deref(), &note.text, BODY_SIZE);
    }
}

fn write_marked(writer: &mut PageWriter, marker: &str, item: &Item, x: f32) {
    writer.reserve(BODY_SIZE * LEADING);
    let marker_y = writer.y - BODY_SIZE * LEADING;
    writer.text(x, marker_y, Font::Regular, BODY_SIZE, marker);
    writer.paragraph(x + INDENT, item.label.as_deref(), &item.text, BODY_SIZE);
}

fn write_table(writer: &mut PageWriter, table: &Table, x: f32) {
    let columns = table.column_count();
    if columns == 0 {
        return;
    }
    let width = PAGE_WIDTH - MARGIN - x;
    let col_width = width / columns as f32;
    let line_height = BODY_SIZE * LEADING;

    writer.y -= 4.0;
    let header = (!table.headers.is_empty()).then_some(&table.headers);
    for (row_idx, row) in header.into_iter().chain(table.rows.iter()).enumerate() {
        let is_header = header.is_some() && row_idx == 0;
        let font = if is_header { Font::Bold } else { Font::Regular };
        let cells: Vec<Vec<String>> = (0..columns)
            .map(|c| {
                let text = row.get(c).map(String::as_str).unwrap_or("");
                wrap(text, font, BODY_SIZE, col_width - 2.0 * CELL_PADDING, 0.0)
            })
            .collect();
        let row_height = cells.iter().map(Vec::len).max().unwrap_or(1) as f32 * line_height
            + 2.0 * CELL_PADDING;

        writer.reserve(row_height);
        let top = writer.y;
        let bottom = top - row_height;
        if is_header {
            writer.fill_rect(x, bottom, width, row_height, 0.88);
        }
        for (c, lines) in cells.iter().enumerate() {
            let cell_x = x + c as f32 * col_width + CELL_PADDING;
            for (l, line) in lines.iter().enumerate() {
                let baseline = top - CELL_PADDING - (l as f32 + 1.0) * line_height + 2.0;
                if !line.is_empty() {
                    writer.text(cell_x, baseline, font, BODY_SIZE, line);
                }
            }
        }
        writer.line(x, top, x + width, top, 0.5);
        writer.line(x, bottom, x + width, bottom, 0.5);
        for c in 0..=columns {
            let line_x = x + c as f32 * col_width;
            writer.line(line_x, top, line_x, bottom, 0.5);
        }
        writer.y = bottom;
    }
    writer.y -= 4.0;
}

fn write_figures(writer: &mut PageWriter, figures: &[&Figure]) {
    if figures.is_empty() {
        return;
    }
    writer.reserve(BODY_SIZE * LEADING * 2.0);
    writer.y -= BODY_SIZE * LEADING * 1.5;
    writer.text(MARGIN, writer.y, Font::Bold, BODY_SIZE, "Visual Reference from Rulebook");

    for figure in figures {
        let scale = (CONTENT_WIDTH / figure.width as f32)
            .min(MAX_FIGURE_HEIGHT / figure.height as f32)
            .min(1.0);
        let (w, h) = (figure.width as f32 * scale, figure.height as f32 * scale);
        writer.reserve(h + 8.0);
        writer.y -= h + 8.0;
        writer.image(&figure.name, MARGIN + (CONTENT_WIDTH - w) / 2.0, writer.y, w, h);
    }
}

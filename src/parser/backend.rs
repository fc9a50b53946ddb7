//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the PDF operations the extractor
//! needs, isolating the concrete PDF library (lopdf) from the content
//! stream interpreter.

use std::collections::BTreeMap;
use std::io::Cursor;

use image::{DynamicImage, GrayImage, RgbImage};

use crate::error::{Error, Result};
use crate::model::Metadata;

use super::matrix::Matrix;

/// PDF object identifier: (object number, generation number).
pub type ObjectId = (u32, u16);

/// Page identifier.
pub type PageId = ObjectId;

/// Where named resources (fonts, XObjects) are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceScope {
    /// The page's own (or inherited) resources
    Page(PageId),
    /// A Form XObject's resources, falling back to the page's
    Form { form: ObjectId, page: PageId },
}

impl ResourceScope {
    pub fn page(&self) -> PageId {
        match *self {
            ResourceScope::Page(page) => page,
            ResourceScope::Form { page, .. } => page,
        }
    }
}

/// Glyph metrics of a simple font.
#[derive(Debug, Clone, Default)]
pub struct FontMetrics {
    /// Base font name (e.g., "Helvetica-Bold")
    pub base_font: String,
    /// Code of the first entry in `widths`
    pub first_char: u32,
    /// Glyph widths in 1/1000 text space units
    pub widths: Vec<f32>,
    /// Composite (Type0) fonts use two-byte codes
    pub two_byte: bool,
}

impl FontMetrics {
    /// Fallback advance for unknown glyphs, in 1/1000 em.
    const DEFAULT_WIDTH: f32 = 500.0;

    /// Unscaled advance of `bytes` at `font_size`.
    pub fn text_width(&self, bytes: &[u8], font_size: f32) -> f32 {
        let units: f32 = if self.two_byte {
            (bytes.len() / 2) as f32 * Self::DEFAULT_WIDTH
        } else {
            bytes
                .iter()
                .map(|&b| {
                    (b as u32)
                        .checked_sub(self.first_char)
                        .and_then(|i| self.widths.get(i as usize).copied())
                        .filter(|w| *w > 0.0)
                        .unwrap_or(Self::DEFAULT_WIDTH)
                })
                .sum()
        };
        units / 1000.0 * font_size
    }
}

/// Kind of a named XObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XObjectKind {
    Image,
    Form,
    Other,
}

/// A named XObject from a resource dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XObjectRef {
    pub name: Vec<u8>,
    pub id: ObjectId,
    pub kind: XObjectKind,
}

/// Decoded content of a Form XObject.
#[derive(Debug, Clone)]
pub struct FormXObject {
    pub content: Vec<u8>,
    pub matrix: Matrix,
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    pub fn as_number(&self) -> Option<f32> {
        get_number_from_value(self)
    }
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    pub fn new(operator: impl Into<String>, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.into(),
            operands,
        }
    }

    /// Numeric operand at `idx`, or `default`.
    pub fn number(&self, idx: usize, default: f32) -> f32 {
        self.operands
            .get(idx)
            .and_then(PdfValue::as_number)
            .unwrap_or(default)
    }
}

/// Abstract interface for PDF document access.
///
/// Implementations provide page enumeration, content stream decoding,
/// font and XObject lookup, and image extraction, without exposing any
/// concrete PDF library types.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return the page's MediaBox as `[x0, y0, x1, y1]`.
    fn media_box(&self, page: PageId) -> [f32; 4];

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Metrics for a font resource, if it exists.
    fn font(&self, scope: ResourceScope, font_name: &[u8]) -> Option<FontMetrics>;

    /// Decode a text byte sequence using the font's encoding.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, scope: ResourceScope, font_name: &[u8], bytes: &[u8]) -> String;

    /// All XObjects named in the scope's resources.
    fn xobjects(&self, scope: ResourceScope) -> Vec<XObjectRef>;

    /// Look up one named XObject.
    fn xobject(&self, scope: ResourceScope, name: &[u8]) -> Option<XObjectRef> {
        self.xobjects(scope).into_iter().find(|x| x.name == name)
    }

    /// Content and matrix of a Form XObject.
    fn form(&self, id: ObjectId) -> Result<FormXObject>;

    /// Encoded bytes of an image XObject.
    fn image_bytes(&self, id: ObjectId) -> Result<Vec<u8>>;

    /// Document information.
    fn metadata(&self) -> Metadata;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// LopdfBackend: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

use lopdf::{Dictionary, Document as LopdfDocument, Object, Stream};

/// Resource inheritance is followed at most this many levels up the page tree.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Ok(Self { doc })
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self { doc })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Dereference `obj` to a dictionary.
    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Dereference `obj` if it is a reference.
    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(r) => self.doc.get_object(*r).unwrap_or(obj),
            _ => obj,
        }
    }

    fn stream(&self, id: ObjectId) -> Result<&Stream> {
        self.doc
            .get_object(id)?
            .as_stream()
            .map_err(|e| Error::PdfParse(e.to_string()))
    }

    /// Look up `key` on a page node, following `/Parent` for inherited attributes.
    fn inherited(&self, page: PageId, key: &[u8]) -> Option<&Object> {
        let mut current = page;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = self.doc.get_dictionary(current).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            current = dict.get(b"Parent").ok()?.as_reference().ok()?;
        }
        None
    }

    fn resources(&self, scope: ResourceScope) -> Option<&Dictionary> {
        if let ResourceScope::Form { form, .. } = scope {
            let own = self
                .stream(form)
                .ok()
                .and_then(|s| s.dict.get(b"Resources").ok())
                .and_then(|r| self.resolve_dict(r));
            if own.is_some() {
                return own;
            }
        }
        self.inherited(scope.page(), b"Resources")
            .and_then(|r| self.resolve_dict(r))
    }

    fn font_dict(&self, scope: ResourceScope, font_name: &[u8]) -> Option<&Dictionary> {
        let fonts = self.resources(scope)?.get(b"Font").ok()?;
        let font = self.resolve_dict(fonts)?.get(font_name).ok()?;
        self.resolve_dict(font)
    }

    /// Number of color components for an image color space, if it is one we
    /// can re-encode.
    fn color_components(&self, color_space: &Object) -> Option<u8> {
        match self.resolve(color_space) {
            Object::Name(name) => match name.as_slice() {
                b"DeviceGray" | b"CalGray" | b"G" => Some(1),
                b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(3),
                b"DeviceCMYK" | b"CMYK" => Some(4),
                _ => None,
            },
            Object::Array(arr) => {
                let family = arr.first()?.as_name().ok()?;
                match family {
                    b"ICCBased" => {
                        let profile = self.stream(arr.get(1)?.as_reference().ok()?).ok()?;
                        let n = profile.dict.get(b"N").ok()?.as_i64().ok()?;
                        u8::try_from(n).ok()
                    }
                    b"CalRGB" => Some(3),
                    b"CalGray" => Some(1),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn media_box(&self, page: PageId) -> [f32; 4] {
        let letter = [0.0, 0.0, 612.0, 792.0];
        let Some(Object::Array(arr)) = self.inherited(page, b"MediaBox").map(|o| self.resolve(o))
        else {
            return letter;
        };
        let nums: Vec<f32> = arr.iter().filter_map(get_number).collect();
        match nums.as_slice() {
            [x0, y0, x1, y1] => [x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)],
            _ => letter,
        }
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without content is blank, not broken.
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r)? {
                Object::Stream(s) => Ok(s.decompressed_content().unwrap_or_else(|_| s.content.clone())),
                Object::Array(arr) => Ok(self.concat_streams(arr)),
                _ => Err(Error::PdfParse("Invalid content stream".to_string())),
            },
            Object::Array(arr) => Ok(self.concat_streams(arr)),
            Object::Stream(s) => Ok(s.decompressed_content().unwrap_or_else(|_| s.content.clone())),
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        decode_operations(data)
    }

    fn font(&self, scope: ResourceScope, font_name: &[u8]) -> Option<FontMetrics> {
        let dict = self.font_dict(scope, font_name)?;

        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_else(|| String::from_utf8_lossy(font_name).to_string());
        let two_byte = matches!(dict.get(b"Subtype").and_then(|s| s.as_name()), Ok(b"Type0"));
        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);
        let widths = dict
            .get(b"Widths")
            .ok()
            .map(|w| self.resolve(w))
            .and_then(|w| w.as_array().ok())
            .map(|arr| arr.iter().map(|o| get_number(self.resolve(o)).unwrap_or(0.0)).collect())
            .unwrap_or_default();

        Some(FontMetrics {
            base_font,
            first_char,
            widths,
            two_byte,
        })
    }

    fn decode_text(&self, scope: ResourceScope, font_name: &[u8], bytes: &[u8]) -> String {
        if let Some(font_dict) = self.font_dict(scope, font_name) {
            if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn xobjects(&self, scope: ResourceScope) -> Vec<XObjectRef> {
        let Some(dict) = self
            .resources(scope)
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|x| self.resolve_dict(x))
        else {
            return Vec::new();
        };

        dict.iter()
            .filter_map(|(name, obj)| {
                let id = obj.as_reference().ok()?;
                let stream = self.stream(id).ok()?;
                let kind = match stream.dict.get(b"Subtype").and_then(|s| s.as_name()) {
                    Ok(b"Image") => XObjectKind::Image,
                    Ok(b"Form") => XObjectKind::Form,
                    _ => XObjectKind::Other,
                };
                Some(XObjectRef {
                    name: name.clone(),
                    id,
                    kind,
                })
            })
            .collect()
    }

    fn form(&self, id: ObjectId) -> Result<FormXObject> {
        let stream = self.stream(id)?;
        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|m| m.as_array().ok())
            .map(|arr| arr.iter().filter_map(get_number).collect::<Vec<_>>())
            .and_then(|n| Matrix::from_slice(&n))
            .unwrap_or(Matrix::IDENTITY);

        Ok(FormXObject { content, matrix })
    }

    fn image_bytes(&self, id: ObjectId) -> Result<Vec<u8>> {
        let stream = self.stream(id)?;
        let dict = &stream.dict;

        if !matches!(dict.get(b"Subtype").and_then(|s| s.as_name()), Ok(b"Image")) {
            return Err(Error::ImageExtract(format!("{:?} is not an image XObject", id)));
        }

        let filters: Vec<&[u8]> = match dict.get(b"Filter").map(|f| self.resolve(f)) {
            Ok(Object::Name(n)) => vec![n.as_slice()],
            Ok(Object::Array(arr)) => arr.iter().filter_map(|o| o.as_name().ok()).collect(),
            _ => Vec::new(),
        };

        match filters.as_slice() {
            [b"DCTDecode"] | [b"DCT"] | [b"JPXDecode"] => return Ok(stream.content.clone()),
            [] | [b"FlateDecode"] | [b"Fl"] | [b"LZWDecode"] | [b"LZW"] => {}
            _ => {
                log::debug!("Image {:?} uses filters the extractor passes through raw", id);
                return Ok(stream.content.clone());
            }
        }

        let samples = if filters.is_empty() {
            stream.content.clone()
        } else {
            stream
                .decompressed_content()
                .map_err(|e| Error::ImageExtract(format!("{:?}: {}", id, e)))?
        };

        let dimension = |key: &[u8]| {
            dict.get(key)
                .ok()
                .and_then(|o| o.as_i64().ok())
                .and_then(|n| u32::try_from(n).ok())
        };
        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        let components = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|cs| self.color_components(cs));

        match (dimension(b"Width"), dimension(b"Height"), components) {
            (Some(w), Some(h), Some(n)) if bits == 8 => {
                Ok(encode_png(&samples, w, h, n).unwrap_or(samples))
            }
            _ => Ok(samples),
        }
    }

    fn metadata(&self) -> Metadata {
        let mut metadata = Metadata {
            pdf_version: self.doc.version.to_string(),
            page_count: self.doc.get_pages().len() as u32,
            encrypted: self.doc.is_encrypted(),
            ..Default::default()
        };

        let info = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|i| self.resolve_dict(i));

        if let Some(info) = info {
            metadata.title = get_string_from_dict(info, b"Title");
            metadata.author = get_string_from_dict(info, b"Author");
            metadata.creator = get_string_from_dict(info, b"Creator");
            metadata.producer = get_string_from_dict(info, b"Producer");
            metadata.created =
                get_string_from_dict(info, b"CreationDate").and_then(|d| parse_pdf_date(&d));
        }

        metadata
    }
}

impl LopdfBackend {
    fn concat_streams(&self, arr: &[Object]) -> Vec<u8> {
        let mut content = Vec::new();
        for obj in arr {
            if let Object::Reference(r) = obj {
                if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                    match s.decompressed_content() {
                        Ok(data) => content.extend_from_slice(&data),
                        Err(_) => content.extend_from_slice(&s.content),
                    }
                    content.push(b' ');
                }
            }
        }
        content
    }
}

/// Re-encode 8-bit raw samples as PNG. CMYK is converted to RGB.
fn encode_png(samples: &[u8], width: u32, height: u32, components: u8) -> Option<Vec<u8>> {
    let expected = width as usize * height as usize * components as usize;
    let samples = samples.get(..expected)?;

    let img = match components {
        1 => DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, samples.to_vec())?),
        3 => DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, samples.to_vec())?),
        4 => {
            let rgb: Vec<u8> = samples
                .chunks_exact(4)
                .flat_map(|px| {
                    let k = 255 - px[3] as u16;
                    [0, 1, 2].map(|i| ((255 - px[i] as u16) * k / 255) as u8)
                })
                .collect();
            DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, rgb)?)
        }
        _ => return None,
    };

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .ok()?;
    Some(buf)
}

/// Parse raw content stream bytes with lopdf's content decoder.
pub fn decode_operations(data: &[u8]) -> Result<Vec<ContentOp>> {
    let content =
        lopdf::content::Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

    Ok(content
        .operations
        .into_iter()
        .map(|op| ContentOp {
            operator: op.operator,
            operands: op.operands.iter().map(convert_object).collect(),
        })
        .collect())
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Helper to get a string from a PDF dictionary.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_text_simple(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let field = |range: std::ops::Range<usize>, default: u32| {
        s.get(range).and_then(|v| v.parse().ok()).unwrap_or(default)
    };

    chrono::NaiveDate::from_ymd_opt(year, field(4..6, 1), field(6..8, 1))
        .and_then(|date| date.and_hms_opt(field(8..10, 0), field(10..12, 0), field(12..14, 0)))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}

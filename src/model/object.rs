//! Page objects: text blocks and image placements.

use serde::{Serialize, Serializer};

use super::ImageFormat;

/// PDF object identifier of an embedded image: (object number, generation).
pub type Xref = (u32, u16);

/// Axis-aligned box in PDF points with a top-left origin (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Create a box, normalizing the corner order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// The full rectangle of a page.
    pub fn page(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Smallest box enclosing all `points`, or `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = (f32, f32)>) -> Option<Self> {
        points.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => Self::new(x, y, x, y),
                Some(b) => Self::new(b.x0.min(x), b.y0.min(y), b.x1.max(x), b.y1.max(y)),
            })
        })
    }

    /// Smallest box enclosing both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Corner tuple `(x0, y0, x1, y1)`.
    pub fn as_tuple(&self) -> (f32, f32, f32, f32) {
        (self.x0, self.y0, self.x1, self.y1)
    }
}

/// A block of text with its position and dominant font.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextObject {
    pub text: String,
    pub bbox: BBox,
    pub font_size: f32,
    pub font_name: String,
}

impl TextObject {
    /// Font size recorded when a block carries no font information.
    pub const DEFAULT_FONT_SIZE: f32 = 11.0;
    /// Font name recorded when a block carries no font information.
    pub const DEFAULT_FONT_NAME: &'static str = "Times-Roman";

    pub fn new(text: impl Into<String>, bbox: BBox, font_size: f32, font_name: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bbox,
            font_size,
            font_name: font_name.into(),
        }
    }
}

/// An image placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageObject {
    /// Encoded image file contents (JPEG, PNG, ...), or raw samples.
    #[serde(rename = "byte_len", serialize_with = "serialize_len")]
    pub image_bytes: Vec<u8>,
    /// Format detected from the leading bytes.
    pub format: ImageFormat,
    pub bbox: BBox,
    pub xref: Xref,
}

impl ImageObject {
    pub fn new(image_bytes: Vec<u8>, bbox: BBox, xref: Xref) -> Self {
        let format = ImageFormat::detect(&image_bytes);
        Self {
            image_bytes,
            format,
            bbox,
            xref,
        }
    }

    /// File extension for writing the bytes to disk.
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }
}

fn serialize_len<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(bytes.len() as u64)
}

/// A classified page block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageObject {
    Text(TextObject),
    Image(ImageObject),
}

impl PageObject {
    pub fn bbox(&self) -> BBox {
        match self {
            PageObject::Text(t) => t.bbox,
            PageObject::Image(i) => i.bbox,
        }
    }

    pub fn as_text(&self) -> Option<&TextObject> {
        match self {
            PageObject::Text(t) => Some(t),
            PageObject::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageObject> {
        match self {
            PageObject::Image(i) => Some(i),
            PageObject::Text(_) => None,
        }
    }
}

impl From<TextObject> for PageObject {
    fn from(t: TextObject) -> Self {
        PageObject::Text(t)
    }
}

impl From<ImageObject> for PageObject {
    fn from(i: ImageObject) -> Self {
        PageObject::Image(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_normalizes_and_unions() {
        let a = BBox::new(10.0, 20.0, 0.0, 5.0);
        assert_eq!(a.as_tuple(), (0.0, 5.0, 10.0, 20.0));

        let b = BBox::new(5.0, 0.0, 30.0, 10.0);
        let u = a.union(&b);
        assert_eq!(u.as_tuple(), (0.0, 0.0, 30.0, 20.0));
        assert_eq!(u.width(), 30.0);
        assert_eq!(u.height(), 20.0);
    }

    #[test]
    fn test_bbox_from_points() {
        assert!(BBox::from_points(Vec::new()).is_none());
        let b = BBox::from_points(vec![(3.0, 4.0), (1.0, 9.0), (7.0, 2.0)]).unwrap();
        assert_eq!(b.as_tuple(), (1.0, 2.0, 7.0, 9.0));
    }

    #[test]
    fn test_image_object_detects_format() {
        let png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
        let img = ImageObject::new(png, BBox::default(), (7, 0));
        assert_eq!(img.format, ImageFormat::Png);
        assert_eq!(img.extension(), "png");
    }

    #[test]
    fn test_image_object_serializes_length_only() {
        let img = ImageObject::new(vec![0u8; 42], BBox::default(), (3, 0));
        let json = serde_json::to_string(&PageObject::Image(img)).unwrap();
        assert!(json.contains("\"type\":\"image\""));
        assert!(json.contains("\"byte_len\":42"));
    }
}

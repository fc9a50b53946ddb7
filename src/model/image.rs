//! Image format detection for extracted image bytes.

use serde::Serialize;

/// Encoded format of extracted image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Tiff,
    Bmp,
    WebP,
    Jpeg2000,
    /// Undecoded samples or an unrecognized encoding
    Raw,
}

impl ImageFormat {
    /// Detect the format from magic bytes.
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ImageFormat::Jpeg
        } else if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            ImageFormat::Png
        } else if data.starts_with(b"GIF") {
            ImageFormat::Gif
        } else if data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            ImageFormat::Tiff
        } else if data.starts_with(b"BM") {
            ImageFormat::Bmp
        } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            ImageFormat::WebP
        } else if data.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20])
            || data.starts_with(&[0xFF, 0x4F, 0xFF, 0x51])
        {
            ImageFormat::Jpeg2000
        } else {
            ImageFormat::Raw
        }
    }

    /// File extension used when saving.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Bmp => "bmp",
            ImageFormat::WebP => "webp",
            ImageFormat::Jpeg2000 => "jp2",
            ImageFormat::Raw => "raw",
        }
    }

    /// MIME type, if the format is a real file format.
    pub fn mime_type(&self) -> Option<&'static str> {
        match self {
            ImageFormat::Jpeg => Some("image/jpeg"),
            ImageFormat::Png => Some("image/png"),
            ImageFormat::Gif => Some("image/gif"),
            ImageFormat::Tiff => Some("image/tiff"),
            ImageFormat::Bmp => Some("image/bmp"),
            ImageFormat::WebP => Some("image/webp"),
            ImageFormat::Jpeg2000 => Some("image/jp2"),
            ImageFormat::Raw => None,
        }
    }

    /// Whether browsers and the `image` crate can decode this format.
    pub fn is_displayable(&self) -> bool {
        !matches!(self, ImageFormat::Jpeg2000 | ImageFormat::Raw)
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(ImageFormat::detect(&jpeg), ImageFormat::Jpeg);

        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(ImageFormat::detect(&png), ImageFormat::Png);

        assert_eq!(ImageFormat::detect(b"GIF89a.."), ImageFormat::Gif);
        assert_eq!(ImageFormat::detect(&[0, 0, 0, 0]), ImageFormat::Raw);
        assert_eq!(ImageFormat::detect(&[]), ImageFormat::Raw);
    }

    #[test]
    fn test_extension_and_mime() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
        assert_eq!(ImageFormat::Raw.extension(), "raw");
        assert_eq!(ImageFormat::Png.mime_type(), Some("image/png"));
        assert_eq!(ImageFormat::Raw.mime_type(), None);
        assert!(!ImageFormat::Jpeg2000.is_displayable());
    }

    #[test]
    fn test_webp_is_decodable() {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 40, 40]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, image::ImageFormat::WebP)
            .unwrap();
        let bytes = bytes.into_inner();

        let format = ImageFormat::detect(&bytes);
        assert_eq!(format, ImageFormat::WebP);
        assert!(format.is_displayable());
        assert_eq!(image::load_from_memory(&bytes).unwrap().width(), 4);
    }
}

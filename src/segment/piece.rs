//! Cropping and validating individual pieces.

use image::{DynamicImage, GenericImageView};

use super::analysis::{has_meaningful_content, is_empty_image, DEFAULT_EDGE_THRESHOLD, DEFAULT_VARIANCE_THRESHOLD};
use super::options::PieceBox;

/// Background share tolerated in a kept piece.
const PIECE_BACKGROUND_THRESHOLD: f64 = 0.90;
/// Smallest kept piece side, in pixels.
const MIN_PIECE_SIDE: u32 = 10;

/// Crop `bbox` grown by `padding` on every side, clamped to the image.
pub fn extract_piece(img: &DynamicImage, bbox: PieceBox, padding: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    let x0 = bbox.x.saturating_sub(padding).min(width);
    let y0 = bbox.y.saturating_sub(padding).min(height);
    let x1 = bbox.x.saturating_add(bbox.width).saturating_add(padding).min(width);
    let y1 = bbox.y.saturating_add(bbox.height).saturating_add(padding).min(height);

    img.crop_imm(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
}

/// Whether a cropped piece is worth keeping.
pub fn is_valid_piece(piece: &DynamicImage, min_content_ratio: f64) -> bool {
    let (width, height) = piece.dimensions();
    if width < MIN_PIECE_SIDE || height < MIN_PIECE_SIDE {
        return false;
    }
    if is_empty_image(piece, PIECE_BACKGROUND_THRESHOLD, DEFAULT_VARIANCE_THRESHOLD) {
        return false;
    }
    has_meaningful_content(piece, min_content_ratio, DEFAULT_EDGE_THRESHOLD)
}

//! Piece detection: thresholding, morphology and external contours.

use std::ops::RangeInclusive;

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{close, open};

use super::options::PieceBox;

/// Gaussian sigma matching an 11 pixel threshold window.
const ADAPTIVE_SIGMA: f32 = 2.0;
/// Offset subtracted from the local mean.
const ADAPTIVE_C: i16 = 2;

/// Saturation at or below which a bright pixel is white (0-255 scale).
const WHITE_MAX_SATURATION: u8 = 30;
/// Value at or above which an unsaturated pixel is white.
const WHITE_MIN_VALUE: u8 = 200;

/// Minimum area used by grid detection.
pub const GRID_MIN_AREA: f64 = 1000.0;

const CONTOUR_ASPECT: RangeInclusive<f64> = 0.1..=10.0;
const COLOR_ASPECT: RangeInclusive<f64> = 0.2..=5.0;

/// Find pieces by adaptive thresholding and external contours.
///
/// Pieces with an area outside `min_area..=max_area` or an aspect ratio
/// outside 1:10 to 10:1 are dropped.
pub fn detect_pieces_contour(img: &DynamicImage, min_area: f64, max_area: Option<f64>) -> Vec<PieceBox> {
    let mask = adaptive_threshold_inv(&img.to_luma8());
    // 3x3 kernel: close twice, open once
    let mask = close(&mask, Norm::LInf, 2);
    let mask = open(&mask, Norm::LInf, 1);

    external_boxes(&mask, min_area, max_area, CONTOUR_ASPECT)
}

/// Find pieces as connected regions of non-white pixels.
pub fn detect_pieces_color_based(img: &DynamicImage, min_area: f64) -> Vec<PieceBox> {
    let rgb = img.to_rgb8();
    let mut mask = GrayImage::new(rgb.width(), rgb.height());
    for (x, y, pixel) in rgb.enumerate_pixels() {
        if !is_white(pixel.0) {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    // 5x5 kernel: close twice, open once
    let mask = close(&mask, Norm::LInf, 4);
    let mask = open(&mask, Norm::LInf, 2);

    external_boxes(&mask, min_area, None, COLOR_ASPECT)
}

/// Contour pieces in reading order (top to bottom, then left to right).
///
/// When both `rows` and `cols` are given and enough pieces were found, only
/// the first `rows * cols` are kept.
pub fn detect_pieces_grid(img: &DynamicImage, rows: Option<usize>, cols: Option<usize>) -> Vec<PieceBox> {
    let mut boxes = detect_pieces_contour(img, GRID_MIN_AREA, None);
    if boxes.len() < 2 {
        return boxes;
    }

    boxes.sort_by_key(|b| (b.y, b.x));
    if let (Some(rows), Some(cols)) = (rows, cols) {
        let expected = rows.saturating_mul(cols);
        if expected > 0 && boxes.len() >= expected {
            boxes.truncate(expected);
        }
    }
    boxes
}

/// Inverted binary threshold against a Gaussian-weighted local mean.
fn adaptive_threshold_inv(gray: &GrayImage) -> GrayImage {
    let mean = gaussian_blur_f32(gray, ADAPTIVE_SIGMA);
    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        let threshold = mean.get_pixel(x, y)[0] as i16 - ADAPTIVE_C;
        if pixel[0] as i16 <= threshold {
            out.put_pixel(x, y, Luma([255]));
        }
    }
    out
}

/// HSV whiteness test on the 0-255 saturation and value scales.
fn is_white([r, g, b]: [u8; 3]) -> bool {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let saturation = if max == 0 {
        0
    } else {
        ((max - min) as u32 * 255 / max as u32) as u8
    };
    saturation <= WHITE_MAX_SATURATION && max >= WHITE_MIN_VALUE
}

fn external_boxes(
    mask: &GrayImage,
    min_area: f64,
    max_area: Option<f64>,
    aspect: RangeInclusive<f64>,
) -> Vec<PieceBox> {
    find_contours::<i32>(mask)
        .iter()
        .filter(|c| c.parent.is_none() && matches!(c.border_type, BorderType::Outer))
        .filter(|c| {
            let area = contour_area(c);
            area >= min_area && max_area.map_or(true, |max| area <= max)
        })
        .filter_map(bounding_box)
        .filter(|b| aspect.contains(&b.aspect_ratio()))
        .collect()
}

/// Polygon area enclosed by the contour points (shoelace formula).
fn contour_area(contour: &Contour<i32>) -> f64 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

fn bounding_box(contour: &Contour<i32>) -> Option<PieceBox> {
    let min_x = contour.points.iter().map(|p| p.x).min()?;
    let max_x = contour.points.iter().map(|p| p.x).max()?;
    let min_y = contour.points.iter().map(|p| p.y).min()?;
    let max_y = contour.points.iter().map(|p| p.y).max()?;
    Some(PieceBox::new(
        min_x as u32,
        min_y as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::testing::{blank, draw_piece};
    use image::Rgb;

    /// Four 48px pieces on a 2x2 grid.
    fn four_pieces() -> DynamicImage {
        let mut img = blank(200, 200);
        for (x, y) in [(20, 20), (120, 20), (20, 120), (120, 120)] {
            draw_piece(&mut img, x, y, 48);
        }
        DynamicImage::ImageRgb8(img)
    }

    fn sorted(mut boxes: Vec<PieceBox>) -> Vec<PieceBox> {
        boxes.sort_by_key(|b| (b.y, b.x));
        boxes
    }

    #[test]
    fn test_is_white() {
        assert!(is_white([255, 255, 255]));
        assert!(is_white([210, 205, 200]));
        assert!(!is_white([190, 190, 190]));
        assert!(!is_white([255, 200, 200]));
        assert!(!is_white([0, 0, 0]));
    }

    #[test]
    fn test_contour_detection() {
        let boxes = sorted(detect_pieces_contour(&four_pieces(), 500.0, None));
        assert_eq!(
            boxes,
            vec![
                PieceBox::new(20, 20, 48, 48),
                PieceBox::new(120, 20, 48, 48),
                PieceBox::new(20, 120, 48, 48),
                PieceBox::new(120, 120, 48, 48),
            ]
        );

        assert!(detect_pieces_contour(&four_pieces(), 5000.0, None).is_empty());
        assert!(detect_pieces_contour(&four_pieces(), 500.0, Some(1000.0)).is_empty());
    }

    #[test]
    fn test_contour_rejects_thin_shapes() {
        let mut img = blank(300, 100);
        for x in 10..290 {
            for y in 40..60 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let img = DynamicImage::ImageRgb8(img);
        assert!(detect_pieces_contour(&img, 500.0, None).is_empty());
    }

    #[test]
    fn test_color_detection() {
        let mut img = blank(200, 100);
        for x in 10..60 {
            for y in 10..60 {
                img.put_pixel(x, y, Rgb([200, 30, 30]));
            }
        }
        for x in 100..160 {
            for y in 20..80 {
                img.put_pixel(x, y, Rgb([212, 175, 55]));
            }
        }
        let boxes = sorted(detect_pieces_color_based(&DynamicImage::ImageRgb8(img), 500.0));
        assert_eq!(
            boxes,
            vec![PieceBox::new(10, 10, 50, 50), PieceBox::new(100, 20, 60, 60)]
        );
    }

    #[test]
    fn test_grid_detection_order() {
        let boxes = detect_pieces_grid(&four_pieces(), None, None);
        assert_eq!(boxes.len(), 4);
        assert_eq!((boxes[0].x, boxes[0].y), (20, 20));
        assert_eq!((boxes[1].x, boxes[1].y), (120, 20));
        assert_eq!((boxes[2].x, boxes[2].y), (20, 120));

        let first_row = detect_pieces_grid(&four_pieces(), Some(1), Some(2));
        assert_eq!(first_row.len(), 2);
        assert!(first_row.iter().all(|b| b.y == 20));

        // more cells requested than found: keep everything
        assert_eq!(detect_pieces_grid(&four_pieces(), Some(3), Some(3)).len(), 4);
        assert_eq!(detect_pieces_grid(&four_pieces(), Some(usize::MAX), Some(2)).len(), 4);
    }

    #[test]
    fn test_blank_image_has_no_pieces() {
        let img = DynamicImage::ImageRgb8(blank(100, 100));
        assert!(detect_pieces_contour(&img, 500.0, None).is_empty());
        assert!(detect_pieces_color_based(&img, 500.0).is_empty());
        assert!(detect_pieces_grid(&img, Some(2), Some(2)).is_empty());
    }
}

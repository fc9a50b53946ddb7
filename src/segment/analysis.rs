//! Content checks for whole images and cropped pieces.

use std::path::Path;

use image::{DynamicImage, GenericImageView};
use imageproc::edges::canny;

pub const DEFAULT_BACKGROUND_THRESHOLD: f64 = 0.95;
pub const DEFAULT_VARIANCE_THRESHOLD: f64 = 10.0;
pub const DEFAULT_EDGE_THRESHOLD: f32 = 50.0;

/// Alpha below this counts as transparent.
const TRANSPARENT_ALPHA: u8 = 10;
/// Gray levels above this count as light background.
const LIGHT_LEVEL: u8 = 240;
/// Gray levels below this count as dark background.
const DARK_LEVEL: u8 = 15;

/// Whether an image is mostly empty.
///
/// An image is empty when it has no pixels, when its gray levels barely
/// vary, or when more than `background_threshold` of its pixels are
/// transparent, light or dark.
pub fn is_empty_image(img: &DynamicImage, background_threshold: f64, variance_threshold: f64) -> bool {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return true;
    }
    let total = (width as u64 * height as u64) as f64;

    let gray = img.to_luma8();
    if variance(gray.as_raw()) < variance_threshold {
        return true;
    }

    if img.color().has_alpha() {
        let transparent = img
            .to_rgba8()
            .pixels()
            .filter(|p| p[3] < TRANSPARENT_ALPHA)
            .count();
        if transparent as f64 / total > background_threshold {
            return true;
        }
    }

    let light = gray.as_raw().iter().filter(|&&v| v > LIGHT_LEVEL).count();
    if light as f64 / total > background_threshold {
        return true;
    }

    let dark = gray.as_raw().iter().filter(|&&v| v < DARK_LEVEL).count();
    dark as f64 / total > background_threshold
}

/// Whether Canny edges (thresholds `edge_threshold` and twice that) cover
/// at least `min_content_ratio` of the image.
pub fn has_meaningful_content(img: &DynamicImage, min_content_ratio: f64, edge_threshold: f32) -> bool {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return false;
    }

    let edges = canny(&img.to_luma8(), edge_threshold, edge_threshold * 2.0);
    let edge_pixels = edges.as_raw().iter().filter(|&&v| v > 0).count();
    edge_pixels as f64 / (width as u64 * height as u64) as f64 >= min_content_ratio
}

/// Whether an image file shows nothing but background.
///
/// Files that cannot be loaded count as background.
pub fn is_background_only<P: AsRef<Path>>(path: P, background_threshold: f64) -> bool {
    let path = path.as_ref();
    match image::open(path) {
        Ok(img) => is_background(&img, background_threshold),
        Err(e) => {
            log::warn!("Error checking background for {}: {}", path.display(), e);
            true
        }
    }
}

/// Whether an image file is likely a composite of several pieces: it loads,
/// is not background only, and is at least `min_size` pixels wide or tall.
pub fn is_composite_image<P: AsRef<Path>>(path: P, min_size: u32) -> bool {
    let path = path.as_ref();
    let img = match image::open(path) {
        Ok(img) => img,
        Err(e) => {
            log::warn!("Error checking composite status for {}: {}", path.display(), e);
            return false;
        }
    };
    if is_background(&img, DEFAULT_BACKGROUND_THRESHOLD) {
        return false;
    }

    let (width, height) = img.dimensions();
    width >= min_size || height >= min_size
}

fn is_background(img: &DynamicImage, background_threshold: f64) -> bool {
    is_empty_image(img, background_threshold, DEFAULT_VARIANCE_THRESHOLD)
        || !has_meaningful_content(img, 0.05, DEFAULT_EDGE_THRESHOLD)
}

/// Population variance.
fn variance(values: &[u8]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n
}

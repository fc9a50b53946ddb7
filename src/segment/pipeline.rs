//! Segmenting composite image files into piece files.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};

use crate::detect::is_image_file;
use crate::error::Result;

use super::analysis::is_composite_image;
use super::detection::{detect_pieces_color_based, detect_pieces_contour, detect_pieces_grid};
use super::options::{PieceBox, SegmentMethod, SegmentOptions};
use super::piece::{extract_piece, is_valid_piece};

/// Input image path → written piece paths.
pub type SegmentResults = BTreeMap<PathBuf, Vec<PathBuf>>;

/// File name of the `index`-th (1-based) piece cut from `stem`.
pub fn piece_file_name(stem: &str, index: usize) -> String {
    format!("{}_piece_{:03}.png", stem, index)
}

/// Locate pieces with the configured method.
pub fn detect_pieces(img: &DynamicImage, options: &SegmentOptions) -> Vec<PieceBox> {
    match options.method {
        SegmentMethod::Auto => {
            let boxes = detect_pieces_contour(img, options.min_area, options.max_area);
            if boxes.len() >= 2 {
                return boxes;
            }
            log::info!("Contour detection found few pieces, trying color-based...");
            detect_pieces_color_based(img, options.min_area)
        }
        SegmentMethod::Contour => detect_pieces_contour(img, options.min_area, options.max_area),
        SegmentMethod::Color => detect_pieces_color_based(img, options.min_area),
        SegmentMethod::Grid { rows, cols } => detect_pieces_grid(img, rows, cols),
    }
}

/// Split one composite image into pieces saved under `output_dir`.
///
/// Pieces are written as `{stem}_piece_{NNN}.png`, numbered by detection
/// order, so filtered pieces leave gaps. An image that cannot be loaded
/// yields no pieces.
pub fn segment_composite_image<P, Q>(image_path: P, output_dir: Q, options: &SegmentOptions) -> Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let image_path = image_path.as_ref();
    let output_dir = output_dir.as_ref();

    let img = match image::open(image_path) {
        Ok(img) => DynamicImage::ImageRgb8(img.to_rgb8()),
        Err(e) => {
            log::error!("Failed to load image {}: {}", image_path.display(), e);
            return Ok(Vec::new());
        }
    };
    let (width, height) = img.dimensions();
    log::info!("Processing {} ({}x{})", display_name(image_path), width, height);

    if options.clear_output && output_dir.exists() {
        log::debug!("Clearing output directory: {}", output_dir.display());
        std::fs::remove_dir_all(output_dir)?;
    }
    std::fs::create_dir_all(output_dir)?;

    let boxes = detect_pieces(&img, options);
    if boxes.is_empty() {
        log::warn!("No pieces detected in {}", image_path.display());
        return Ok(Vec::new());
    }
    log::info!("Detected {} potential pieces", boxes.len());

    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    let mut extracted = Vec::new();
    let mut skipped = 0;
    for (idx, bbox) in boxes.iter().enumerate() {
        let piece = extract_piece(&img, *bbox, options.padding);

        if options.filter_empty && !is_valid_piece(&piece, options.min_content_ratio) {
            skipped += 1;
            log::debug!("  Skipped empty piece {}: {}", idx + 1, bbox);
            continue;
        }

        let path = output_dir.join(piece_file_name(&stem, idx + 1));
        piece.save_with_format(&path, image::ImageFormat::Png)?;
        log::debug!("  Extracted piece {}: {}", idx + 1, bbox);
        extracted.push(path);
    }

    if skipped > 0 {
        log::info!("Skipped {} empty/background pieces", skipped);
    }
    log::info!("Extracted {} valid pieces to {}", extracted.len(), output_dir.display());
    Ok(extracted)
}

/// Segment every composite image in `input_dir`, in sorted file order.
///
/// Each composite's pieces go to `output_dir/{stem}/`. When two inputs
/// share a stem, the later one uses `output_dir/{file name}/` instead.
/// Images that are not composites, and composites that yield no pieces,
/// are left out of the result.
pub fn segment_all_composites<P, Q>(input_dir: P, output_dir: Q, options: &SegmentOptions) -> Result<SegmentResults>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref();

    let mut image_files = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            image_files.push(path);
        }
    }
    image_files.sort();
    log::info!("Found {} images in {}", image_files.len(), input_dir.display());

    let mut results = SegmentResults::new();
    let mut used_dirs = HashSet::new();
    for path in image_files {
        if !is_composite_image(&path, options.min_size) {
            log::debug!("Skipping {} (not a composite)", display_name(&path));
            continue;
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir_name = if used_dirs.contains(&stem) {
            display_name(&path)
        } else {
            stem
        };
        used_dirs.insert(dir_name.clone());

        let extracted = segment_composite_image(&path, output_dir.join(dir_name), options)?;
        if !extracted.is_empty() {
            results.insert(path, extracted);
        }
    }

    log::info!("Processed {} composite images", results.len());
    Ok(results)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::testing::{blank, composite, draw_piece};
    use image::Rgb;

    #[test]
    fn test_piece_file_name() {
        assert_eq!(piece_file_name("page3_img1", 1), "page3_img1_piece_001.png");
        assert_eq!(piece_file_name("x", 120), "x_piece_120.png");
    }

    #[test]
    fn test_segment_composite_image() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sheet.png");
        let mut img = blank(200, 200);
        for (x, y) in [(20, 20), (120, 20), (20, 120), (120, 120)] {
            draw_piece(&mut img, x, y, 48);
        }
        img.save(&input).unwrap();

        let out = dir.path().join("pieces");
        let paths = segment_composite_image(&input, &out, &SegmentOptions::default()).unwrap();
        assert_eq!(paths.len(), 4);
        assert!(paths.iter().all(|p| p.exists()));
        assert!(out.join("sheet_piece_001.png").exists());

        let piece = image::open(&paths[0]).unwrap();
        assert_eq!(piece.dimensions(), (58, 58));
    }

    #[test]
    fn test_auto_falls_back_to_color() {
        let mut img = blank(200, 100);
        draw_piece(&mut img, 20, 20, 48);
        draw_piece(&mut img, 120, 20, 48);
        let img = DynamicImage::ImageRgb8(img);

        // contour detection caps the area, color detection does not
        let options = SegmentOptions::default().with_max_area(1000.0);
        assert!(detect_pieces_contour(&img, options.min_area, options.max_area).is_empty());

        let mut boxes = detect_pieces(&img, &options);
        boxes.sort_by_key(|b| b.x);
        assert_eq!(boxes, vec![PieceBox::new(20, 20, 48, 48), PieceBox::new(120, 20, 48, 48)]);

        let contour_only = options.with_method(SegmentMethod::Contour);
        assert!(detect_pieces(&img, &contour_only).is_empty());
    }

    #[test]
    fn test_empty_pieces_are_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("mixed.png");
        let mut img = blank(220, 120);
        draw_piece(&mut img, 10, 20, 48);
        // a flat gray square: detected, but has no content
        for x in 110..190 {
            for y in 20..100 {
                img.put_pixel(x, y, Rgb([60, 60, 60]));
            }
        }
        img.save(&input).unwrap();

        let options = SegmentOptions::default().with_method(SegmentMethod::Color);
        let out = dir.path().join("filtered");
        let kept = segment_composite_image(&input, &out, &options).unwrap();
        assert_eq!(kept.len(), 1);

        let out = dir.path().join("all");
        let all = segment_composite_image(&input, &out, &options.clone().keep_empty()).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_clear_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sheet.png");
        composite(300, 120).save(&input).unwrap();

        let out = dir.path().join("pieces");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("stale.png"), b"old").unwrap();

        let options = SegmentOptions::default().keep_output();
        segment_composite_image(&input, &out, &options).unwrap();
        assert!(out.join("stale.png").exists());

        segment_composite_image(&input, &out, &SegmentOptions::default()).unwrap();
        assert!(!out.join("stale.png").exists());
    }

    #[test]
    fn test_unreadable_image_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.png");
        std::fs::write(&input, b"not an image").unwrap();

        let out = dir.path().join("out");
        let paths = segment_composite_image(&input, &out, &SegmentOptions::default()).unwrap();
        assert!(paths.is_empty());
        assert!(!out.exists());
    }

    #[test]
    fn test_segment_all_composites() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("images");
        std::fs::create_dir_all(&input).unwrap();
        composite(1100, 200).save(input.join("B_sheet.PNG")).unwrap();
        composite(300, 120).save(input.join("a_small.png")).unwrap();
        blank(1200, 1200).save(input.join("c_blank.png")).unwrap();
        std::fs::write(input.join("notes.txt"), b"ignored").unwrap();

        let out = dir.path().join("segmented");
        let results = segment_all_composites(&input, &out, &SegmentOptions::default()).unwrap();

        assert_eq!(results.len(), 1);
        let (source, pieces) = results.iter().next().unwrap();
        assert_eq!(source, &input.join("B_sheet.PNG"));
        assert!(!pieces.is_empty());
        assert!(pieces.iter().all(|p| p.starts_with(out.join("B_sheet"))));
    }

    #[test]
    fn test_same_stem_composites_keep_their_pieces() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("images");
        std::fs::create_dir_all(&input).unwrap();
        composite(300, 300).save(input.join("a.png")).unwrap();
        composite(300, 300).save(input.join("a.bmp")).unwrap();

        let out = dir.path().join("segmented");
        let options = SegmentOptions::default().with_min_size(250);
        let results = segment_all_composites(&input, &out, &options).unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[&input.join("a.bmp")].iter().all(|p| p.starts_with(out.join("a"))));
        assert!(results[&input.join("a.png")].iter().all(|p| p.starts_with(out.join("a.png"))));
        assert!(results.values().flatten().all(|p| p.exists()));
    }
}

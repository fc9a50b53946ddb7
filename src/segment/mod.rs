//! Splitting composite images into individual piece images.
//!
//! Rulebooks often scan several game pieces into one picture. Pieces are
//! located with classical heuristics (adaptive thresholding, morphology,
//! external contours, or a non-white color mask), cropped with padding and
//! saved as PNG files. Crops that are blank or carry too few edges are
//! dropped.

mod analysis;
mod detection;
mod options;
mod piece;
mod pipeline;

pub use analysis::{
    has_meaningful_content, is_background_only, is_composite_image, is_empty_image,
    DEFAULT_BACKGROUND_THRESHOLD, DEFAULT_EDGE_THRESHOLD, DEFAULT_VARIANCE_THRESHOLD,
};
pub use detection::{detect_pieces_color_based, detect_pieces_contour, detect_pieces_grid, GRID_MIN_AREA};
pub use options::{PieceBox, SegmentMethod, SegmentOptions};
pub use piece::{extract_piece, is_valid_piece};
pub use pipeline::{detect_pieces, piece_file_name, segment_all_composites, segment_composite_image, SegmentResults};

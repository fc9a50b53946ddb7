//! Segmentation options.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;

/// How pieces are located in a composite image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentMethod {
    /// Contour detection, falling back to color masking when it finds
    /// fewer than two pieces.
    #[default]
    Auto,
    /// Adaptive threshold and external contours.
    Contour,
    /// Mask of non-white pixels.
    Color,
    /// Contour boxes in reading order, optionally cut to `rows * cols`.
    Grid {
        rows: Option<usize>,
        cols: Option<usize>,
    },
}

impl SegmentMethod {
    /// Parse a method name, falling back to [`SegmentMethod::Contour`] with a
    /// warning for unknown names.
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            log::warn!("Unknown method '{}', using contour detection", name);
            SegmentMethod::Contour
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            SegmentMethod::Auto => "auto",
            SegmentMethod::Contour => "contour",
            SegmentMethod::Color => "color",
            SegmentMethod::Grid { .. } => "grid",
        }
    }
}

impl FromStr for SegmentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(SegmentMethod::Auto),
            "contour" => Ok(SegmentMethod::Contour),
            "color" => Ok(SegmentMethod::Color),
            "grid" => Ok(SegmentMethod::Grid { rows: None, cols: None }),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for SegmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Axis-aligned piece location in pixels: `(x, y, width, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PieceBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PieceBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Width over height; zero for a degenerate box.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

impl fmt::Display for PieceBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} at ({}, {})", self.width, self.height, self.x, self.y)
    }
}

/// Options for segmenting composite images.
#[derive(Debug, Clone)]
pub struct SegmentOptions {
    pub method: SegmentMethod,

    /// Minimum width or height for an image to count as a composite
    pub min_size: u32,

    /// Minimum contour area of a piece, in pixels
    pub min_area: f64,

    /// Maximum contour area of a piece (contour method only)
    pub max_area: Option<f64>,

    /// Pixels added around each cropped piece
    pub padding: u32,

    /// Skip pieces that are empty or background only
    pub filter_empty: bool,

    /// Remove the output directory before writing pieces
    pub clear_output: bool,

    /// Minimum edge coverage of a kept piece
    pub min_content_ratio: f64,
}

impl SegmentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: SegmentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_min_size(mut self, min_size: u32) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }

    pub fn with_max_area(mut self, max_area: f64) -> Self {
        self.max_area = Some(max_area);
        self
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Keep every detected piece, including empty ones.
    pub fn keep_empty(mut self) -> Self {
        self.filter_empty = false;
        self
    }

    /// Leave existing files in the output directory.
    pub fn keep_output(mut self) -> Self {
        self.clear_output = false;
        self
    }
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            method: SegmentMethod::Auto,
            min_size: 1000,
            min_area: 500.0,
            max_area: None,
            padding: 5,
            filter_empty: true,
            clear_output: true,
            min_content_ratio: 0.05,
        }
    }
}

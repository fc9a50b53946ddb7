//! Grouping text spans into lines and lines into blocks.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{BBox, TextObject};

use super::layout::{is_spaceless_script_char, TextSpan};

/// Spans on one baseline further apart than this many ems are separate lines.
const COLUMN_GAP_EMS: f32 = 3.0;

/// Lines are horizontally related when their extents overlap by this much.
const MIN_OVERLAP: f32 = 1.0;

/// A text line composed of spans on the same baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// The spans in this line, sorted by X position
    pub spans: Vec<TextSpan>,
    /// Y position (baseline)
    pub y: f32,
    /// Leftmost X position
    pub x: f32,
    /// Rightmost X position
    pub right: f32,
    /// Dominant font size in this line
    pub font_size: f32,
}

impl TextLine {
    /// Create a new text line from spans.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

        let total_chars: usize = spans.iter().map(|s| s.text.len()).sum();
        let weighted_size: f32 = spans
            .iter()
            .map(|s| s.font_size * s.text.len() as f32)
            .sum();
        let font_size = match spans.first() {
            Some(_) if total_chars > 0 => weighted_size / total_chars as f32,
            Some(first) => first.font_size,
            None => 0.0,
        };

        let y = spans.first().map(|s| s.y).unwrap_or(0.0);
        let x = spans.first().map(|s| s.x).unwrap_or(0.0);
        let right = spans.iter().map(TextSpan::right).fold(x, f32::max);

        Self {
            spans,
            y,
            x,
            right,
            font_size,
        }
    }

    /// Get the combined text of all spans with appropriate spacing.
    ///
    /// Inserts spaces between spans based on their X coordinate gaps.
    /// No space is inserted between adjacent CJK characters.
    pub fn text(&self) -> String {
        let mut result = String::new();

        for (i, span) in self.spans.iter().enumerate() {
            if i == 0 {
                result.push_str(&span.text);
                continue;
            }

            let prev_span = &self.spans[i - 1];
            let gap = span.x - prev_span.right();

            let char_count = span.text.chars().count();
            let avg_char_width = if char_count > 0 && span.width > 0.0 {
                span.width / char_count as f32
            } else {
                span.font_size * 0.5
            };

            let should_insert_space = gap > avg_char_width * 0.2
                && !(prev_span.text.chars().last().is_some_and(is_spaceless_script_char)
                    && span.text.chars().next().is_some_and(is_spaceless_script_char));

            let prev_ends_with_space =
                prev_span.text.ends_with(' ') || prev_span.text.ends_with('\u{00A0}');
            let curr_starts_with_space =
                span.text.starts_with(' ') || span.text.starts_with('\u{00A0}');

            if should_insert_space && !prev_ends_with_space && !curr_starts_with_space {
                result.push(' ');
            }

            result.push_str(&span.text);
        }

        result
    }

    fn overlaps(&self, other: &TextLine) -> bool {
        self.right.min(other.right) - self.x.max(other.x) >= MIN_OVERLAP
    }
}

/// A run of related lines: one paragraph, heading, or list entry.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
}

impl TextBlock {
    /// Lines joined with newlines, trimmed.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    pub fn spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.lines.iter().flat_map(|l| l.spans.iter())
    }

    /// Content-stream position of the block's earliest span.
    pub fn seq(&self) -> usize {
        self.spans().map(|s| s.seq).min().unwrap_or(0)
    }

    /// Union of span boxes in user space (y up).
    pub fn bbox(&self) -> BBox {
        self.spans()
            .map(TextSpan::bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
    }

    /// Character-weighted dominant font size and name.
    pub fn dominant_font(&self) -> (f32, String) {
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        let mut chars = 0usize;
        let mut weighted = 0.0f32;

        for span in self.spans() {
            let n = span.text.chars().count();
            chars += n;
            weighted += span.font_size * n as f32;
            if !span.font_name.is_empty() {
                *by_name.entry(span.font_name.as_str()).or_default() += n;
            }
        }

        let size = if chars > 0 && weighted > 0.0 {
            weighted / chars as f32
        } else {
            TextObject::DEFAULT_FONT_SIZE
        };
        let name = by_name
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| TextObject::DEFAULT_FONT_NAME.to_string());

        (size, name)
    }

    /// Convert to a [`TextObject`] with a top-left-origin bbox, or `None` if
    /// the block has no visible text.
    pub fn to_text_object(&self, page_top: f32) -> Option<TextObject> {
        let text = self.text();
        if text.is_empty() {
            return None;
        }
        let b = self.bbox();
        let (font_size, font_name) = self.dominant_font();
        Some(TextObject::new(
            text,
            BBox::new(b.x0, page_top - b.y1, b.x1, page_top - b.y0),
            font_size,
            font_name,
        ))
    }

    fn last_line(&self) -> Option<&TextLine> {
        self.lines.last()
    }
}

/// Group spans into lines, top to bottom then left to right.
///
/// Spans within 30% of the font size vertically share a line. A wide
/// horizontal gap splits a baseline into separate lines (columns).
pub fn group_spans_into_lines(spans: Vec<TextSpan>) -> Vec<TextLine> {
    let mut spans = spans;
    // PDF Y is bottom-up
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut baselines: Vec<Vec<TextSpan>> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let y_tolerance = span.font_size * 0.3;
        match (current_y, baselines.last_mut()) {
            (Some(y), Some(current)) if (span.y - y).abs() <= y_tolerance => current.push(span),
            _ => {
                current_y = Some(span.y);
                baselines.push(vec![span]);
            }
        }
    }

    let mut lines = Vec::new();
    for mut baseline in baselines {
        baseline.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

        let mut segment: Vec<TextSpan> = Vec::new();
        for span in baseline {
            let split = segment.last().is_some_and(|prev: &TextSpan| {
                span.x - prev.right() > prev.font_size.max(span.font_size) * COLUMN_GAP_EMS
            });
            if split {
                lines.push(TextLine::from_spans(std::mem::take(&mut segment)));
            }
            segment.push(span);
        }
        if !segment.is_empty() {
            lines.push(TextLine::from_spans(segment));
        }
    }

    lines
}

/// Group lines into blocks based on spacing, font size and indentation.
///
/// Each line joins the most recent block whose last line sits directly
/// above it in the same horizontal band; otherwise it starts a new block.
pub fn group_lines_into_blocks(lines: Vec<TextLine>) -> Vec<TextBlock> {
    let avg_spacing = calculate_avg_line_spacing(&lines);
    let mut blocks: Vec<TextBlock> = Vec::new();

    for line in lines {
        let target = blocks.iter_mut().rev().find(|block| {
            block
                .last_line()
                .is_some_and(|prev| !should_break_block(prev, &line, avg_spacing))
        });

        match target {
            Some(block) => block.lines.push(line),
            None => blocks.push(TextBlock { lines: vec![line] }),
        }
    }

    blocks
}

/// Calculate average line spacing.
fn calculate_avg_line_spacing(lines: &[TextLine]) -> f32 {
    let mut spacings: Vec<f32> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        // nearest overlapping line above
        let above = lines[..i]
            .iter()
            .rev()
            .find(|prev| prev.overlaps(line) && prev.y - line.y > 0.1);
        if let Some(prev) = above {
            spacings.push(prev.y - line.y);
        }
    }

    if spacings.is_empty() {
        return 12.0;
    }

    spacings.iter().sum::<f32>() / spacings.len() as f32
}

/// Determine if `curr_line` cannot continue the block ending in `prev_line`.
fn should_break_block(prev_line: &TextLine, curr_line: &TextLine, avg_spacing: f32) -> bool {
    // Must be below, in the same horizontal band
    let spacing = prev_line.y - curr_line.y;
    if spacing <= 0.1 || !prev_line.overlaps(curr_line) {
        return true;
    }

    // Large spacing indicates new paragraph
    if spacing > avg_spacing * 1.5 {
        return true;
    }

    // Significant font size change
    if (prev_line.font_size - curr_line.font_size).abs() > 1.0 {
        return true;
    }

    // Significant left margin change (indentation)
    (prev_line.x - curr_line.x).abs() > 20.0
}

/// Build text objects from spans, each paired with its content-stream position.
pub fn text_objects(spans: Vec<TextSpan>, page_top: f32) -> Vec<(usize, TextObject)> {
    group_lines_into_blocks(group_spans_into_lines(spans))
        .iter()
        .filter_map(|block| block.to_text_object(page_top).map(|t| (block.seq(), t)))
        .collect()
}

//! Cleanup of extracted reference text.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// A line holding nothing but a page number, optionally dash-decorated.
/// Only matched against the first and last non-blank line of a page.
static PAGE_NUMBER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-–—]?\s*\d{1,4}\s*[-–—]?\s*$").expect("valid regex"));

/// Cleanup preset levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPreset {
    /// Unicode NFC normalization and trailing whitespace only
    #[default]
    Minimal,
    /// Everything, including page number headers and footers
    Standard,
}

/// Options for text cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Fix ligatures (fi, fl, etc.)
    pub fix_ligatures: bool,

    /// Remove Unicode replacement character (U+FFFD)
    pub remove_replacement_char: bool,

    /// Drop a leading or trailing line that is only a page number
    pub remove_page_numbers: bool,

    /// Strip whitespace at line ends
    pub trim_trailing_whitespace: bool,

    /// Maximum consecutive blank lines (0 = unlimited)
    pub max_blank_lines: u8,
}

impl CleanupOptions {
    /// Create options from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        match preset {
            CleanupPreset::Minimal => Self::minimal(),
            CleanupPreset::Standard => Self::standard(),
        }
    }

    pub fn minimal() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: false,
            remove_replacement_char: false,
            remove_page_numbers: false,
            trim_trailing_whitespace: true,
            max_blank_lines: 0,
        }
    }

    pub fn standard() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: true,
            remove_replacement_char: true,
            remove_page_numbers: true,
            trim_trailing_whitespace: true,
            max_blank_lines: 1,
        }
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self::minimal()
    }
}

/// Text cleanup pipeline.
pub struct CleanupPipeline {
    options: CleanupOptions,
    ligature_map: Vec<(&'static str, &'static str)>,
}

impl CleanupPipeline {
    pub fn new(options: CleanupOptions) -> Self {
        Self {
            options,
            ligature_map: vec![
                ("\u{FB00}", "ff"),
                ("\u{FB01}", "fi"),
                ("\u{FB02}", "fl"),
                ("\u{FB03}", "ffi"),
                ("\u{FB04}", "ffl"),
                ("\u{FB05}", "st"),
                ("\u{FB06}", "st"),
            ],
        }
    }

    pub fn from_preset(preset: CleanupPreset) -> Self {
        Self::new(CleanupOptions::from_preset(preset))
    }

    /// Process text through the cleanup pipeline.
    pub fn process(&self, text: &str) -> String {
        let mut result = if self.options.normalize_unicode {
            text.nfc().collect::<String>()
        } else {
            text.to_string()
        };

        if self.options.fix_ligatures {
            for (ligature, replacement) in &self.ligature_map {
                result = result.replace(ligature, replacement);
            }
        }

        if self.options.remove_replacement_char {
            result = result.replace('\u{FFFD}', "");
        }

        let first = result.lines().position(|l| !l.trim().is_empty());
        let last = result.lines().collect::<Vec<_>>().iter().rposition(|l| !l.trim().is_empty());

        let mut lines: Vec<&str> = Vec::new();
        let mut blank_run = 0u8;
        for (idx, line) in result.lines().enumerate() {
            let at_edge = Some(idx) == first || Some(idx) == last;
            if self.options.remove_page_numbers && at_edge && PAGE_NUMBER_LINE.is_match(line) {
                continue;
            }
            let line = if self.options.trim_trailing_whitespace {
                line.trim_end()
            } else {
                line
            };

            if line.trim().is_empty() {
                blank_run = blank_run.saturating_add(1);
                if self.options.max_blank_lines > 0 && blank_run > self.options.max_blank_lines {
                    continue;
                }
            } else {
                blank_run = 0;
            }
            lines.push(line);
        }

        lines.join("\n").trim_matches('\n').to_string()
    }
}

impl Default for CleanupPipeline {
    fn default() -> Self {
        Self::new(CleanupOptions::default())
    }
}

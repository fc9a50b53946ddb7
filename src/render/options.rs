//! Rendering options and configuration.

use std::path::PathBuf;

use super::CleanupOptions;

/// Default directory for extracted images.
pub const DEFAULT_IMAGE_DIR: &str = "cheatsheet_images";

/// Options for rendering cheat sheet artifacts.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Directory to save extracted images
    pub image_dir: PathBuf,

    /// Append the rulebook's full text to the plain-text sheet
    pub include_reference_text: bool,

    /// Cleanup applied to reference text
    pub cleanup: Option<CleanupOptions>,

    /// Embed figure images in the PDF sheet
    pub embed_figures: bool,

    /// Character width of the text sheet's banners
    pub banner_width: usize,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image directory.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = dir.into();
        self
    }

    pub fn with_reference_text(mut self, include: bool) -> Self {
        self.include_reference_text = include;
        self
    }

    /// Set cleanup options.
    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// Keep reference text exactly as extracted.
    pub fn without_cleanup(mut self) -> Self {
        self.cleanup = None;
        self
    }

    pub fn with_figures(mut self, embed: bool) -> Self {
        self.embed_figures = embed;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            include_reference_text: true,
            cleanup: Some(CleanupOptions::default()),
            embed_figures: true,
            banner_width: 70,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert_eq!(options.image_dir, PathBuf::from("cheatsheet_images"));
        assert_eq!(options.banner_width, 70);
        assert!(options.include_reference_text);
        assert_eq!(options.cleanup, Some(CleanupOptions::minimal()));
    }

    #[test]
    fn test_builder() {
        let options = RenderOptions::new()
            .with_image_dir("out/img")
            .without_cleanup()
            .with_reference_text(false)
            .with_figures(false);
        assert_eq!(options.image_dir, PathBuf::from("out/img"));
        assert!(options.cleanup.is_none());
        assert!(!options.include_reference_text);
        assert!(!options.embed_figures);
    }
}

//! Page-level types.

use serde::Serialize;

use super::{BBox, ImageObject, PageObject, TextObject};

/// The objects extracted from one page, in content-stream order.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedPage {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points
    pub width: f32,

    /// Page height in points
    pub height: f32,

    pub objects: Vec<PageObject>,
}

impl ExtractedPage {
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            objects: Vec::new(),
        }
    }

    pub fn push(&mut self, object: impl Into<PageObject>) {
        self.objects.push(object.into());
    }

    /// The page rectangle.
    pub fn rect(&self) -> BBox {
        BBox::page(self.width, self.height)
    }

    pub fn text_objects(&self) -> impl Iterator<Item = &TextObject> {
        self.objects.iter().filter_map(PageObject::as_text)
    }

    /// Image objects paired with their index in [`Self::objects`].
    pub fn image_objects(&self) -> impl Iterator<Item = (usize, &ImageObject)> {
        self.objects
            .iter()
            .enumerate()
            .filter_map(|(idx, obj)| obj.as_image().map(|img| (idx, img)))
    }

    pub fn image_count(&self) -> usize {
        self.image_objects().count()
    }

    /// Whether an image with this xref is already on the page.
    pub fn has_image(&self, xref: super::Xref) -> bool {
        self.image_objects().any(|(_, img)| img.xref == xref)
    }

    /// Trimmed text of every text object, one per line, or `None` if the
    /// page has no text.
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self.text_objects().map(|t| t.text.trim()).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> ExtractedPage {
        let mut page = ExtractedPage::new(3, 612.0, 792.0);
        page.push(TextObject::new("  Strongholds  ", BBox::default(), 11.0, "Times-Roman"));
        page.push(ImageObject::new(vec![1, 2, 3], BBox::default(), (12, 0)));
        page.push(TextObject::new("Sites of Power", BBox::default(), 11.0, "Times-Roman"));
        page
    }

    #[test]
    fn test_page_text_joins_trimmed_blocks() {
        let page = sample_page();
        assert_eq!(page.text().unwrap(), "Strongholds\nSites of Power");
        assert!(ExtractedPage::new(1, 1.0, 1.0).text().is_none());
    }

    #[test]
    fn test_image_objects_keep_object_index() {
        let page = sample_page();
        let images: Vec<_> = page.image_objects().map(|(i, img)| (i, img.xref)).collect();
        assert_eq!(images, vec![(1, (12, 0))]);
        assert!(page.has_image((12, 0)));
        assert!(!page.has_image((13, 0)));
        assert_eq!(page.image_count(), 1);
    }
}

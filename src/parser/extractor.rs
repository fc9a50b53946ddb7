//! Page object extraction.

use std::collections::HashMap;
use std::path::Path;

use crate::detect::detect_format_from_path;
use crate::error::{Error, Result};
use crate::model::{BBox, ExtractedDocument, ExtractedPage, ImageObject, PageObject};

use super::backend::{LopdfBackend, ObjectId, PageId, PdfBackend, ResourceScope, XObjectKind};
use super::blocks;
use super::layout::{ContentInterpreter, ImagePlacement};
use super::options::{ErrorMode, ExtractOptions};

/// Extracts classified text and image objects from every selected page.
pub struct ObjectExtractor<B: PdfBackend = LopdfBackend> {
    backend: B,
    options: ExtractOptions,
}

impl ObjectExtractor<LopdfBackend> {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Verify it's a PDF
        detect_format_from_path(path)?;

        let backend = LopdfBackend::load_file(path)?;
        if backend.raw_doc().is_encrypted() {
            log::warn!("{} is encrypted; text may not decode", path.display());
        }
        Ok(Self::from_backend(backend))
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        crate::detect::detect_format_from_bytes(data)?;
        Ok(Self::from_backend(LopdfBackend::load_bytes(data)?))
    }
}

impl<B: PdfBackend> ObjectExtractor<B> {
    pub fn from_backend(backend: B) -> Self {
        Self {
            backend,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Extract every selected page.
    pub fn extract(&self) -> Result<ExtractedDocument> {
        let mut document = ExtractedDocument::new();
        document.metadata = self.backend.metadata();

        let pages = self.backend.pages();
        document.metadata.page_count = pages.len() as u32;

        for (&number, &page_id) in &pages {
            if !self.options.pages.includes(number) {
                continue;
            }

            match self.extract_page_id(number, page_id) {
                Ok(page) => document.add_page(page),
                Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                    log::warn!("Failed to extract page {}: {}", number, e);
                    let (width, height) = self.page_size(page_id);
                    document.add_page(ExtractedPage::new(number, width, height));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(document)
    }

    /// Extract a single page (1-indexed).
    pub fn extract_page(&self, number: u32) -> Result<ExtractedPage> {
        let pages = self.backend.pages();
        let page_id = pages
            .get(&number)
            .ok_or(Error::PageOutOfRange(number, pages.len() as u32))?;
        self.extract_page_id(number, *page_id)
    }

    fn page_size(&self, page_id: PageId) -> (f32, f32) {
        let [x0, y0, x1, y1] = self.backend.media_box(page_id);
        (x1 - x0, y1 - y0)
    }

    fn extract_page_id(&self, number: u32, page_id: PageId) -> Result<ExtractedPage> {
        let [_, _, _, top] = self.backend.media_box(page_id);
        let (width, height) = self.page_size(page_id);
        let mut page = ExtractedPage::new(number, width, height);

        let content = ContentInterpreter::new(&self.backend)
            .with_max_form_depth(self.options.max_form_depth)
            .run_page(page_id)?;

        let mut ordered: Vec<(usize, PageObject)> = blocks::text_objects(content.spans, top)
            .into_iter()
            .map(|(seq, text)| (seq, PageObject::Text(text)))
            .collect();

        if self.options.extract_images {
            for placement in &content.images {
                if let Some(image) = self.image_object(placement.xref, flip(placement.bbox, top)) {
                    ordered.push((placement.seq, PageObject::Image(image)));
                }
            }
        }

        ordered.sort_by_key(|(seq, _)| *seq);
        for (_, object) in ordered {
            page.push(object);
        }

        if self.options.extract_images {
            self.add_unplaced_images(&mut page, page_id, &content.images, top);
        }

        log::debug!(
            "Page {}: {} text block(s), {} image(s)",
            number,
            page.text_objects().count(),
            page.image_count()
        );
        Ok(page)
    }

    /// Append resource images that produced no object during interpretation.
    fn add_unplaced_images(
        &self,
        page: &mut ExtractedPage,
        page_id: PageId,
        placements: &[ImagePlacement],
        top: f32,
    ) {
        let placed: HashMap<ObjectId, BBox> = placements
            .iter()
            .rev()
            .map(|p| (p.xref, flip(p.bbox, top)))
            .collect();

        let mut visited = Vec::new();
        for xref in self.resource_images(ResourceScope::Page(page_id), &mut visited) {
            if page.has_image(xref) {
                continue;
            }
            let bbox = placed.get(&xref).copied().unwrap_or_else(|| page.rect());
            if let Some(image) = self.image_object(xref, bbox) {
                page.push(image);
            }
        }
    }

    /// Image XObjects reachable from a scope's resources, nested forms included.
    fn resource_images(&self, scope: ResourceScope, visited: &mut Vec<ObjectId>) -> Vec<ObjectId> {
        let mut images = Vec::new();
        for xobject in self.backend.xobjects(scope) {
            match xobject.kind {
                XObjectKind::Image if !images.contains(&xobject.id) => images.push(xobject.id),
                XObjectKind::Form
                    if !visited.contains(&xobject.id)
                        && visited.len() < self.options.max_form_depth as usize * 4 =>
                {
                    visited.push(xobject.id);
                    let nested = ResourceScope::Form {
                        form: xobject.id,
                        page: scope.page(),
                    };
                    for id in self.resource_images(nested, visited) {
                        if !images.contains(&id) {
                            images.push(id);
                        }
                    }
                }
                _ => {}
            }
        }
        images
    }

    fn image_object(&self, xref: ObjectId, bbox: BBox) -> Option<ImageObject> {
        match self.backend.image_bytes(xref) {
            Ok(bytes) if !bytes.is_empty() => Some(ImageObject::new(bytes, bbox, xref)),
            Ok(_) => {
                log::warn!("Image {:?} has no data", xref);
                None
            }
            Err(e) => {
                log::warn!("Skipping image {:?}: {}", xref, e);
                None
            }
        }
    }
}

/// User space (y up) to top-left origin.
fn flip(bbox: BBox, top: f32) -> BBox {
    BBox::new(bbox.x0, top - bbox.y1, bbox.x1, top - bbox.y0)
}

/// Extract all text and image objects from a PDF file.
pub fn extract_objects<P: AsRef<Path>>(path: P) -> Result<ExtractedDocument> {
    ObjectExtractor::open(path)?.extract()
}

//! Content stream interpretation.
//!
//! Walks a page's operators while tracking the graphics state and text state,
//! producing positioned text spans and image placements in content-stream
//! order. Form XObjects are entered recursively.

use std::collections::HashMap;

use crate::error::Result;
use crate::model::BBox;

use super::backend::{
    ContentOp, FontMetrics, ObjectId, PageId, PdfBackend, PdfValue, ResourceScope, XObjectKind,
};
use super::matrix::Matrix;

/// TJ adjustments larger than this (in 1/1000 em) are read as word spaces.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A run of text shown by one text operator.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The decoded text
    pub text: String,
    /// X position (left edge), user space
    pub x: f32,
    /// Y position (baseline), user space
    pub y: f32,
    /// Advance width in user space
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
    /// Base font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Position in the content stream
    pub seq: usize,
}

impl TextSpan {
    pub fn new(text: String, x: f32, y: f32, font_size: f32, font_name: String) -> Self {
        Self {
            text,
            x,
            y,
            width: 0.0,
            font_size,
            font_name,
            seq: 0,
        }
    }

    /// Get the bottom Y coordinate (approximate, based on font size).
    pub fn bottom(&self) -> f32 {
        self.y - self.font_size * 0.2
    }

    /// Get the top Y coordinate (approximate, based on font size).
    pub fn top(&self) -> f32 {
        self.y + self.font_size * 0.8
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bounding box in user space (y up).
    pub fn bbox(&self) -> BBox {
        BBox::new(self.x, self.bottom(), self.right(), self.top())
    }
}

/// One `Do` of an image XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    pub xref: ObjectId,
    /// The unit square under the CTM, user space (y up)
    pub bbox: BBox,
    pub seq: usize,
}

/// Everything drawn on a page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub spans: Vec<TextSpan>,
    pub images: Vec<ImagePlacement>,
}

/// Text state parameters saved and restored with `q`/`Q`.
#[derive(Debug, Clone)]
struct TextState {
    font: Vec<u8>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scaling: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

/// Interprets content streams against a [`PdfBackend`].
pub struct ContentInterpreter<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
    max_form_depth: u8,
    fonts: HashMap<(ResourceScope, Vec<u8>), FontMetrics>,
    content: PageContent,
    seq: usize,
}

impl<'a, B: PdfBackend + ?Sized> ContentInterpreter<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            max_form_depth: 8,
            fonts: HashMap::new(),
            content: PageContent::default(),
            seq: 0,
        }
    }

    pub fn with_max_form_depth(mut self, depth: u8) -> Self {
        self.max_form_depth = depth;
        self
    }

    /// Interpret one page.
    pub fn run_page(mut self, page: PageId) -> Result<PageContent> {
        let data = self.backend.page_content(page)?;
        let ops = self.backend.decode_content(&data)?;
        let mut forms = Vec::new();
        self.run(&ops, ResourceScope::Page(page), Matrix::IDENTITY, &mut forms);
        Ok(self.content)
    }

    fn next_seq(&mut self) -> usize {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    fn run(&mut self, ops: &[ContentOp], scope: ResourceScope, base: Matrix, forms: &mut Vec<ObjectId>) {
        let mut state = GraphicsState {
            ctm: base,
            ..Default::default()
        };
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut tm = Matrix::IDENTITY;
        let mut tlm = Matrix::IDENTITY;
        let mut in_text = false;

        for op in ops {
            match op.operator.as_str() {
                "q" => stack.push(state.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operand(op) {
                        state.ctm = m.multiply(&state.ctm);
                    }
                }
                "BT" => {
                    in_text = true;
                    tm = Matrix::IDENTITY;
                    tlm = Matrix::IDENTITY;
                }
                "ET" => in_text = false,
                "Tf" => {
                    if let Some(PdfValue::Name(name)) = op.operands.first() {
                        state.text.font = name.clone();
                    }
                    state.text.font_size = op.number(1, state.text.font_size);
                }
                "Tc" => state.text.char_spacing = op.number(0, 0.0),
                "Tw" => state.text.word_spacing = op.number(0, 0.0),
                "Tz" => state.text.horizontal_scaling = op.number(0, 100.0) / 100.0,
                "TL" => state.text.leading = op.number(0, 0.0),
                "Td" | "TD" => {
                    let (tx, ty) = (op.number(0, 0.0), op.number(1, 0.0));
                    if op.operator == "TD" {
                        state.text.leading = -ty;
                    }
                    tlm = Matrix::translate(tx, ty).multiply(&tlm);
                    tm = tlm;
                }
                "Tm" => {
                    if let Some(m) = matrix_operand(op) {
                        tlm = m;
                        tm = m;
                    }
                }
                "T*" => {
                    tlm = Matrix::translate(0.0, -state.text.leading).multiply(&tlm);
                    tm = tlm;
                }
                "Tj" | "'" | "\"" => {
                    if op.operator != "Tj" {
                        if op.operator == "\"" {
                            state.text.word_spacing = op.number(0, state.text.word_spacing);
                            state.text.char_spacing = op.number(1, state.text.char_spacing);
                        }
                        tlm = Matrix::translate(0.0, -state.text.leading).multiply(&tlm);
                        tm = tlm;
                    }
                    let idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(PdfValue::Str(bytes)) = op.operands.get(idx) {
                        let items = [PdfValue::Str(bytes.clone())];
                        tm = self.show(&items, scope, &state, tm, in_text);
                    }
                }
                "TJ" => {
                    if let Some(PdfValue::Array(items)) = op.operands.first() {
                        tm = self.show(items, scope, &state, tm, in_text);
                    }
                }
                "Do" => {
                    if let Some(PdfValue::Name(name)) = op.operands.first() {
                        self.invoke(name, scope, state.ctm, forms);
                    }
                }
                _ => {}
            }
        }
    }

    fn font(&mut self, scope: ResourceScope, name: &[u8]) -> FontMetrics {
        let backend = self.backend;
        self.fonts
            .entry((scope, name.to_vec()))
            .or_insert_with(|| backend.font(scope, name).unwrap_or_default())
            .clone()
    }

    /// Show strings and TJ adjustments, returning the advanced text matrix.
    fn show(
        &mut self,
        items: &[PdfValue],
        scope: ResourceScope,
        state: &GraphicsState,
        mut tm: Matrix,
        in_text: bool,
    ) -> Matrix {
        let ts = &state.text;
        let metrics = self.font(scope, &ts.font);
        let start = tm.multiply(&state.ctm);
        let mut text = String::new();

        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    let glyphs = if metrics.two_byte { bytes.len() / 2 } else { bytes.len() };
                    let spaces = if metrics.two_byte {
                        0
                    } else {
                        bytes.iter().filter(|&&b| b == b' ').count()
                    };
                    let tx = (metrics.text_width(bytes, ts.font_size)
                        + ts.char_spacing * glyphs as f32
                        + ts.word_spacing * spaces as f32)
                        * ts.horizontal_scaling;
                    tm = Matrix::translate(tx, 0.0).multiply(&tm);
                    text.push_str(&self.backend.decode_text(scope, &ts.font, bytes));
                }
                PdfValue::Integer(_) | PdfValue::Real(_) => {
                    let adjustment = item.as_number().unwrap_or(0.0);
                    let tx = -adjustment / 1000.0 * ts.font_size * ts.horizontal_scaling;
                    tm = Matrix::translate(tx, 0.0).multiply(&tm);

                    if -adjustment > TJ_SPACE_THRESHOLD {
                        if let Some(last) = text.chars().last() {
                            if !last.is_whitespace() && !is_spaceless_script_char(last) {
                                text.push(' ');
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        if !in_text || text.trim().is_empty() {
            return tm;
        }

        let (x, y) = start.transform(0.0, 0.0);
        let (end_x, _) = tm.multiply(&state.ctm).transform(0.0, 0.0);
        let font_name = if metrics.base_font.is_empty() {
            String::from_utf8_lossy(&ts.font).to_string()
        } else {
            metrics.base_font.clone()
        };

        let mut span = TextSpan::new(text, x, y, ts.font_size * start.vertical_scale(), font_name);
        span.width = (end_x - x).max(0.0);
        span.seq = self.next_seq();
        self.content.spans.push(span);
        tm
    }

    fn invoke(&mut self, name: &[u8], scope: ResourceScope, ctm: Matrix, forms: &mut Vec<ObjectId>) {
        let Some(xobject) = self.backend.xobject(scope, name) else {
            log::debug!("XObject /{} not found", String::from_utf8_lossy(name));
            return;
        };

        match xobject.kind {
            XObjectKind::Image => {
                if let Some(bbox) = BBox::from_points(ctm.unit_square()) {
                    let seq = self.next_seq();
                    self.content.images.push(ImagePlacement {
                        xref: xobject.id,
                        bbox,
                        seq,
                    });
                }
            }
            XObjectKind::Form => {
                if forms.len() >= self.max_form_depth as usize || forms.contains(&xobject.id) {
                    log::debug!("Skipping nested form {:?}", xobject.id);
                    return;
                }
                let form = match self.backend.form(xobject.id) {
                    Ok(form) => form,
                    Err(e) => {
                        log::warn!("Failed to read form {:?}: {}", xobject.id, e);
                        return;
                    }
                };
                let ops = match self.backend.decode_content(&form.content) {
                    Ok(ops) => ops,
                    Err(e) => {
                        log::warn!("Failed to decode form {:?}: {}", xobject.id, e);
                        return;
                    }
                };
                let form_scope = ResourceScope::Form {
                    form: xobject.id,
                    page: scope.page(),
                };
                forms.push(xobject.id);
                self.run(&ops, form_scope, form.matrix.multiply(&ctm), forms);
                forms.pop();
            }
            XObjectKind::Other => {}
        }
    }
}

fn matrix_operand(op: &ContentOp) -> Option<Matrix> {
    let values: Vec<f32> = op.operands.iter().filter_map(PdfValue::as_number).collect();
    Matrix::from_slice(&values)
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub(crate) fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::error::Error;
    use crate::model::Metadata;
    use crate::parser::backend::{decode_operations, decode_text_simple, FormXObject, XObjectRef};

    /// In-memory backend with a single page `(1, 0)`.
    #[derive(Default)]
    pub(crate) struct MockBackend {
        pub content: Vec<u8>,
        pub fonts: HashMap<Vec<u8>, FontMetrics>,
        pub xobjects: HashMap<Option<ObjectId>, Vec<XObjectRef>>,
        pub forms: HashMap<ObjectId, FormXObject>,
        pub images: HashMap<ObjectId, Vec<u8>>,
        /// Make `page_content` fail
        pub broken: bool,
    }

    impl MockBackend {
        pub fn new(content: &str) -> Self {
            Self {
                content: content.as_bytes().to_vec(),
                ..Default::default()
            }
        }

        pub fn with_xobject(mut self, owner: Option<ObjectId>, name: &str, id: ObjectId, kind: XObjectKind) -> Self {
            self.xobjects.entry(owner).or_default().push(XObjectRef {
                name: name.as_bytes().to_vec(),
                id,
                kind,
            });
            self
        }
    }

    impl PdfBackend for MockBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            BTreeMap::from([(1, (1, 0))])
        }

        fn media_box(&self, _page: PageId) -> [f32; 4] {
            [0.0, 0.0, 612.0, 792.0]
        }

        fn page_content(&self, _page: PageId) -> Result<Vec<u8>> {
            if self.broken {
                return Err(Error::PdfParse("broken content".to_string()));
            }
            Ok(self.content.clone())
        }

        fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
            decode_operations(data)
        }

        fn font(&self, _scope: ResourceScope, font_name: &[u8]) -> Option<FontMetrics> {
            self.fonts.get(font_name).cloned()
        }

        fn decode_text(&self, _scope: ResourceScope, _font_name: &[u8], bytes: &[u8]) -> String {
            decode_text_simple(bytes)
        }

        fn xobjects(&self, scope: ResourceScope) -> Vec<XObjectRef> {
            let owner = match scope {
                ResourceScope::Page(_) => None,
                ResourceScope::Form { form, .. } => Some(form),
            };
            self.xobjects.get(&owner).cloned().unwrap_or_default()
        }

        fn form(&self, id: ObjectId) -> Result<FormXObject> {
            self.forms
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::PdfParse(format!("no form {:?}", id)))
        }

        fn image_bytes(&self, id: ObjectId) -> Result<Vec<u8>> {
            self.images
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::ImageExtract(format!("no image {:?}", id)))
        }

        fn metadata(&self) -> Metadata {
            Metadata::default()
        }
    }

    fn run(backend: &MockBackend) -> PageContent {
        ContentInterpreter::new(backend).run_page((1, 0)).unwrap()
    }

    #[test]
    fn test_text_position_and_width() {
        let backend = MockBackend::new("BT /F1 10 Tf 72 700 Td (Hello) Tj ET");
        let content = run(&backend);

        assert_eq!(content.spans.len(), 1);
        let span = &content.spans[0];
        assert_eq!(span.text, "Hello");
        assert_eq!((span.x, span.y), (72.0, 700.0));
        assert_eq!(span.font_size, 10.0);
        // no metrics: half an em per glyph
        assert!((span.width - 25.0).abs() < 1e-3);
        assert_eq!(span.font_name, "F1");
    }

    #[test]
    fn test_font_widths_and_base_font() {
        let mut backend = MockBackend::new("BT /F1 10 Tf (AA) Tj (A) Tj ET");
        backend.fonts.insert(
            b"F1".to_vec(),
            FontMetrics {
                base_font: "Helvetica-Bold".to_string(),
                first_char: 65,
                widths: vec![700.0],
                two_byte: false,
            },
        );
        let content = run(&backend);

        assert_eq!(content.spans[0].font_name, "Helvetica-Bold");
        assert!((content.spans[0].width - 14.0).abs() < 1e-3);
        // second span starts where the first ended
        assert!((content.spans[1].x - 14.0).abs() < 1e-3);
    }

    #[test]
    fn test_ctm_scales_font_size() {
        let backend = MockBackend::new("q 2 0 0 2 0 0 cm BT /F1 10 Tf 10 20 Td (Big) Tj ET Q");
        let span = &run(&backend).spans[0];
        assert_eq!(span.font_size, 20.0);
        assert_eq!((span.x, span.y), (20.0, 40.0));
    }

    #[test]
    fn test_leading_and_next_line() {
        let backend = MockBackend::new("BT /F1 10 Tf 14 TL 72 700 Td (One) Tj T* (Two) Tj (Three) ' ET");
        let ys: Vec<f32> = run(&backend).spans.iter().map(|s| s.y).collect();
        assert_eq!(ys, vec![700.0, 686.0, 672.0]);
    }

    #[test]
    fn test_tj_array_inserts_word_spaces() {
        let backend = MockBackend::new("BT /F1 10 Tf [(Sites) -250 (of) 30 (Power)] TJ ET");
        assert_eq!(run(&backend).spans[0].text, "Sites ofPower");
    }

    #[test]
    fn test_image_placement_and_order() {
        let backend = MockBackend::new(
            "BT /F1 10 Tf (Before) Tj ET q 100 0 0 50 72 500 cm /Im1 Do Q BT (After) Tj ET",
        )
        .with_xobject(None, "Im1", (9, 0), XObjectKind::Image);
        let content = run(&backend);

        assert_eq!(content.images.len(), 1);
        let img = &content.images[0];
        assert_eq!(img.xref, (9, 0));
        assert_eq!(img.bbox.as_tuple(), (72.0, 500.0, 172.0, 550.0));
        assert_eq!(img.seq, 1);
        assert_eq!(content.spans[1].seq, 2);
    }

    #[test]
    fn test_form_recursion_uses_form_matrix() {
        let mut backend = MockBackend::new("q 1 0 0 1 10 10 cm /Fm1 Do Q")
            .with_xobject(None, "Fm1", (20, 0), XObjectKind::Form)
            .with_xobject(Some((20, 0)), "Im7", (7, 0), XObjectKind::Image)
            .with_xobject(Some((20, 0)), "Fm1", (20, 0), XObjectKind::Form);
        backend.forms.insert(
            (20, 0),
            FormXObject {
                // The self-reference must not recurse forever.
                content: b"q 30 0 0 30 0 0 cm /Im7 Do Q /Fm1 Do".to_vec(),
                matrix: Matrix::translate(5.0, 0.0),
            },
        );
        let content = run(&backend);

        assert_eq!(content.images.len(), 1);
        assert_eq!(content.images[0].bbox.as_tuple(), (15.0, 10.0, 45.0, 40.0));
    }

    #[test]
    fn test_form_depth_limit() {
        let mut backend = MockBackend::new("/Fm1 Do")
            .with_xobject(None, "Fm1", (20, 0), XObjectKind::Form)
            .with_xobject(Some((20, 0)), "Im7", (7, 0), XObjectKind::Image);
        backend.forms.insert(
            (20, 0),
            FormXObject {
                content: b"/Im7 Do".to_vec(),
                matrix: Matrix::IDENTITY,
            },
        );

        let content = ContentInterpreter::new(&backend)
            .with_max_form_depth(0)
            .run_page((1, 0))
            .unwrap();
        assert!(content.images.is_empty());
    }

    #[test]
    fn test_text_outside_bt_is_ignored() {
        let backend = MockBackend::new("(stray) Tj BT ( ) Tj ET");
        assert!(run(&backend).spans.is_empty());
    }

    #[test]
    fn test_is_spaceless_script_char() {
        assert!(is_spaceless_script_char('中'));
        assert!(is_spaceless_script_char('あ'));
        assert!(!is_spaceless_script_char('한'));
        assert!(!is_spaceless_script_char('A'));
    }
}

//! Content stream interpreter
//!
//! Runs parsed [`ContentOperation`]s against a graphics state machine and
//! produces [`ContentObject`]s. Form XObjects are interpreted recursively
//! with their own resources; recursion is bounded and cycles are skipped.

use super::objects::{
    ContentObject, GlyphObject, ImageObject, ObjectState, PathObject, PathSegment, TextObject,
    XObjectObject,
};
use super::parser::{ContentOperation, ContentParser, Operand, TextElement};
use super::state::{Color, ColorSpace, DashPattern, GraphicState, MarkedContent, TextState};
use crate::font::Font;
use crate::geometry::{Matrix, Point, Rect};
use crate::pdfobj;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

const MAX_XOBJECT_DEPTH: usize = 16;

/// Flips y so that orientation tests work the same in every space
const FLIP_Y: Matrix = Matrix([1.0, 0.0, 0.0, -1.0, 0.0, 0.0]);

/// Saved state for `q`/`Q`
#[derive(Debug, Clone)]
struct SavedState {
    gstate: GraphicState,
    ctm: Matrix,
    textstate: TextState,
}

/// Interprets content streams of one page
pub struct Interpreter<'a> {
    doc: &'a Document,
    page_index: usize,
    y_down: bool,
    resources: Vec<&'a Dictionary>,
    fonts: HashMap<ObjectId, Arc<Font>>,
    default_font: Arc<Font>,
    gstate: GraphicState,
    ctm: Matrix,
    textstate: TextState,
    stack: Vec<SavedState>,
    mcstack: Vec<MarkedContent>,
    path: Vec<PathSegment>,
    current_point: Point,
    subpath_start: Point,
    xobject_stack: Vec<ObjectId>,
    compatibility: usize,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter for a page.
    ///
    /// `ctm` maps user space to the chosen device space; `y_down` tells
    /// whether that space has y growing downward.
    pub fn new(
        doc: &'a Document,
        page_index: usize,
        resources: Option<&'a Dictionary>,
        ctm: Matrix,
        y_down: bool,
    ) -> Self {
        Self {
            doc,
            page_index,
            y_down,
            resources: resources.into_iter().collect(),
            fonts: HashMap::new(),
            default_font: Arc::new(Font::default()),
            gstate: GraphicState::default(),
            ctm,
            textstate: TextState::default(),
            stack: Vec::new(),
            mcstack: Vec::new(),
            path: Vec::new(),
            current_point: Point::origin(),
            subpath_start: Point::origin(),
            xobject_stack: Vec::new(),
            compatibility: 0,
        }
    }

    /// Interpret a content stream and return the painted objects.
    pub fn run(&mut self, content: &[u8]) -> Vec<ContentObject> {
        let operations = ContentParser::parse_lenient(content);
        let mut objects = Vec::new();
        for operation in operations {
            self.execute(operation, &mut objects);
        }
        if !self.mcstack.is_empty() {
            debug!("{} marked content sections left open", self.mcstack.len());
        }
        objects
    }

    fn object_state(&self) -> ObjectState {
        ObjectState {
            page_index: self.page_index,
            gstate: self.gstate.clone(),
            ctm: self.ctm,
            mcstack: self.mcstack.clone(),
        }
    }

    fn lookup(&self, category: &[u8], name: &str) -> Option<(Option<ObjectId>, &'a Object)> {
        let resources: &'a Dictionary = self.resources.last().copied()?;
        let dict = pdfobj::get_dict(self.doc, resources, category)?;
        let id = pdfobj::get_reference(dict, name.as_bytes());
        let obj = pdfobj::get(self.doc, dict, name.as_bytes())?;
        Some((id, obj))
    }

    fn execute(&mut self, operation: ContentOperation, objects: &mut Vec<ContentObject>) {
        use ContentOperation as Op;
        match operation {
            // Text objects
            Op::BeginText => self.textstate.reset_matrices(),
            Op::EndText => {}

            // Text state
            Op::SetCharSpacing(v) => self.textstate.charspace = v,
            Op::SetWordSpacing(v) => self.textstate.wordspace = v,
            Op::SetHorizontalScaling(v) => self.textstate.scaling = v,
            Op::SetLeading(v) => self.textstate.leading = v,
            Op::SetFont(name, size) => self.set_font(&name, size),
            Op::SetTextRenderMode(mode) => self.textstate.render_mode = mode,
            Op::SetTextRise(v) => self.textstate.rise = v,

            // Text positioning
            Op::MoveText(tx, ty) => self.textstate.move_line(tx, ty),
            Op::MoveTextSetLeading(tx, ty) => {
                self.textstate.leading = -ty;
                self.textstate.move_line(tx, ty);
            }
            Op::SetTextMatrix(matrix) => {
                self.textstate.matrix = matrix;
                self.textstate.line_matrix = matrix;
            }
            Op::NextLine => self.next_line(),

            // Text showing
            Op::ShowText(text) => self.show_text(vec![TextElement::Text(text)], objects),
            Op::ShowTextArray(elements) => self.show_text(elements, objects),
            Op::NextLineShowText(text) => {
                self.next_line();
                self.show_text(vec![TextElement::Text(text)], objects);
            }
            Op::SetSpacingNextLineShowText(aw, ac, text) => {
                self.textstate.wordspace = aw;
                self.textstate.charspace = ac;
                self.next_line();
                self.show_text(vec![TextElement::Text(text)], objects);
            }

            // Graphics state
            Op::SaveGraphicsState => self.stack.push(SavedState {
                gstate: self.gstate.clone(),
                ctm: self.ctm,
                textstate: self.textstate.clone(),
            }),
            Op::RestoreGraphicsState => match self.stack.pop() {
                Some(saved) => {
                    let (matrix, line_matrix) =
                        (self.textstate.matrix, self.textstate.line_matrix);
                    self.gstate = saved.gstate;
                    self.ctm = saved.ctm;
                    self.textstate = saved.textstate;
                    self.textstate.matrix = matrix;
                    self.textstate.line_matrix = line_matrix;
                }
                None => debug!("Unbalanced Q operator"),
            },
            Op::SetTransformMatrix(matrix) => self.ctm = matrix.multiply(&self.ctm),
            Op::SetLineWidth(v) => self.gstate.linewidth = v,
            Op::SetLineCap(v) => self.gstate.linecap = v,
            Op::SetLineJoin(v) => self.gstate.linejoin = v,
            Op::SetMiterLimit(v) => self.gstate.miterlimit = v,
            Op::SetDashPattern(dash, phase) => self.gstate.dash = DashPattern { dash, phase },
            Op::SetIntent(intent) => self.gstate.intent = Some(intent),
            Op::SetFlatness(v) => self.gstate.flatness = v,
            Op::SetGraphicsStateParams(name) => self.set_extgstate(&name),

            // Path construction
            Op::MoveTo(x, y) => {
                let p = Point::new(x, y);
                self.current_point = p;
                self.subpath_start = p;
                self.push_segment('m', &[p]);
            }
            Op::LineTo(x, y) => {
                let p = Point::new(x, y);
                self.current_point = p;
                self.push_segment('l', &[p]);
            }
            Op::CurveTo(x1, y1, x2, y2, x3, y3) => {
                let points = [Point::new(x1, y1), Point::new(x2, y2), Point::new(x3, y3)];
                self.current_point = points[2];
                self.push_segment('c', &points);
            }
            Op::CurveToV(x2, y2, x3, y3) => {
                let points = [Point::new(x2, y2), Point::new(x3, y3)];
                self.current_point = points[1];
                self.push_segment('v', &points);
            }
            Op::CurveToY(x1, y1, x3, y3) => {
                let points = [Point::new(x1, y1), Point::new(x3, y3)];
                self.current_point = points[1];
                self.push_segment('y', &points);
            }
            Op::ClosePath => {
                self.current_point = self.subpath_start;
                self.push_segment('h', &[]);
            }
            Op::Rectangle(x, y, w, h) => {
                let start = Point::new(x, y);
                self.push_segment('m', &[start]);
                self.push_segment('l', &[Point::new(x + w, y)]);
                self.push_segment('l', &[Point::new(x + w, y + h)]);
                self.push_segment('l', &[Point::new(x, y + h)]);
                self.push_segment('h', &[]);
                self.current_point = start;
                self.subpath_start = start;
            }

            // Path painting
            Op::Stroke => self.paint_path(objects, true, false, false, false),
            Op::CloseStroke => self.paint_path(objects, true, false, false, true),
            Op::Fill => self.paint_path(objects, false, true, false, false),
            Op::FillEvenOdd => self.paint_path(objects, false, true, true, false),
            Op::FillStroke => self.paint_path(objects, true, true, false, false),
            Op::FillStrokeEvenOdd => self.paint_path(objects, true, true, true, false),
            Op::CloseFillStroke => self.paint_path(objects, true, true, false, true),
            Op::CloseFillStrokeEvenOdd => self.paint_path(objects, true, true, true, true),
            Op::EndPath => self.path.clear(),
            Op::Clip | Op::ClipEvenOdd => {}

            // Color
            Op::SetStrokingColorSpace(name) => {
                let space = self.colorspace(&name);
                self.gstate.scolor = Color::initial(&space);
                self.gstate.scs = space;
            }
            Op::SetNonStrokingColorSpace(name) => {
                let space = self.colorspace(&name);
                self.gstate.ncolor = Color::initial(&space);
                self.gstate.ncs = space;
            }
            Op::SetStrokingColor(values, pattern) => {
                self.gstate.scolor = Color { values, pattern };
            }
            Op::SetNonStrokingColor(values, pattern) => {
                self.gstate.ncolor = Color { values, pattern };
            }
            Op::SetStrokingGray(g) => {
                self.gstate.scs = ColorSpace::new("DeviceGray", 1);
                self.gstate.scolor = Color::new(vec![g]);
            }
            Op::SetNonStrokingGray(g) => {
                self.gstate.ncs = ColorSpace::new("DeviceGray", 1);
                self.gstate.ncolor = Color::new(vec![g]);
            }
            Op::SetStrokingRGB(r, g, b) => {
                self.gstate.scs = ColorSpace::new("DeviceRGB", 3);
                self.gstate.scolor = Color::new(vec![r, g, b]);
            }
            Op::SetNonStrokingRGB(r, g, b) => {
                self.gstate.ncs = ColorSpace::new("DeviceRGB", 3);
                self.gstate.ncolor = Color::new(vec![r, g, b]);
            }
            Op::SetStrokingCMYK(c, m, y, k) => {
                self.gstate.scs = ColorSpace::new("DeviceCMYK", 4);
                self.gstate.scolor = Color::new(vec![c, m, y, k]);
            }
            Op::SetNonStrokingCMYK(c, m, y, k) => {
                self.gstate.ncs = ColorSpace::new("DeviceCMYK", 4);
                self.gstate.ncolor = Color::new(vec![c, m, y, k]);
            }

            Op::ShadingFill(name) => debug!("Ignoring shading {name}"),

            Op::InlineImage { dict, data } => {
                debug!("Inline image with {} bytes of data", data.len());
                objects.push(ContentObject::Image(self.inline_image(&dict)));
            }
            Op::PaintXObject(name) => self.paint_xobject(&name, objects),

            // Marked content
            Op::BeginMarkedContent(tag) => {
                self.mcstack.push(MarkedContent::new(tag, BTreeMap::new()));
            }
            Op::BeginMarkedContentWithProps(tag, props) => {
                let props = self.properties(props);
                self.mcstack.push(MarkedContent::new(tag, props));
            }
            Op::EndMarkedContent => {
                if self.mcstack.pop().is_none() {
                    debug!("Unbalanced EMC operator");
                }
            }
            Op::DefineMarkedContentPoint(_) | Op::DefineMarkedContentPointWithProps(_, _) => {}

            Op::BeginCompatibility => self.compatibility += 1,
            Op::EndCompatibility => self.compatibility = self.compatibility.saturating_sub(1),

            Op::SetGlyphWidth(_, _) => {}

            Op::Unknown(op) => {
                if self.compatibility == 0 {
                    debug!("Ignoring unknown operator {op}");
                }
            }
        }
    }

    fn next_line(&mut self) {
        let leading = self.textstate.leading;
        self.textstate.move_line(0.0, -leading);
    }

    fn set_font(&mut self, name: &str, size: f64) {
        self.textstate.fontsize = size;
        let Some((id, obj)) = self.lookup(b"Font", name) else {
            warn!("Font {name} not found in resources");
            self.textstate.font = Some(self.default_font.clone());
            return;
        };
        if let Some(font) = id.and_then(|id| self.fonts.get(&id)) {
            self.textstate.font = Some(font.clone());
            return;
        }
        let font = match pdfobj::as_dict(obj) {
            Some(dict) => Arc::new(Font::load(self.doc, dict)),
            None => {
                warn!("Font {name} is not a dictionary");
                self.default_font.clone()
            }
        };
        if let Some(id) = id {
            self.fonts.insert(id, font.clone());
        }
        self.textstate.font = Some(font);
    }

    fn set_extgstate(&mut self, name: &str) {
        let Some(dict) = self.lookup(b"ExtGState", name).and_then(|(_, obj)| pdfobj::as_dict(obj))
        else {
            debug!("ExtGState {name} not found");
            return;
        };
        let doc = self.doc;
        if let Some(v) = pdfobj::get_number(doc, dict, b"LW") {
            self.gstate.linewidth = v;
        }
        if let Some(v) = pdfobj::get_number(doc, dict, b"LC") {
            self.gstate.linecap = v as i64;
        }
        if let Some(v) = pdfobj::get_number(doc, dict, b"LJ") {
            self.gstate.linejoin = v as i64;
        }
        if let Some(v) = pdfobj::get_number(doc, dict, b"ML") {
            self.gstate.miterlimit = v;
        }
        if let Some(v) = pdfobj::get_number(doc, dict, b"CA") {
            self.gstate.stroke_alpha = v;
        }
        if let Some(v) = pdfobj::get_number(doc, dict, b"ca") {
            self.gstate.fill_alpha = v;
        }
        if let Some(v) = pdfobj::get_name(doc, dict, b"RI") {
            self.gstate.intent = Some(v);
        }
        if let Some(items) = pdfobj::get_array(doc, dict, b"D") {
            if let [Object::Array(dash), phase] = items.as_slice() {
                self.gstate.dash = DashPattern {
                    dash: pdfobj::numbers(doc, dash),
                    phase: pdfobj::as_number(phase).unwrap_or(0.0),
                };
            }
        }
        if let Some(items) = pdfobj::get_array(doc, dict, b"Font") {
            if let [font_ref, size] = items.as_slice() {
                let font = pdfobj::resolve(doc, font_ref).and_then(pdfobj::as_dict);
                if let (Some(font), Some(size)) = (font, pdfobj::as_number(size)) {
                    self.textstate.font = Some(Arc::new(Font::load(doc, font)));
                    self.textstate.fontsize = size;
                }
            }
        }
    }

    fn colorspace(&self, name: &str) -> ColorSpace {
        if let Some(space) = ColorSpace::predefined(name) {
            return space;
        }
        match self.lookup(b"ColorSpace", name) {
            Some((_, obj)) => colorspace_from_object(self.doc, obj),
            None => {
                debug!("Unknown color space {name}");
                ColorSpace::new(name, 1)
            }
        }
    }

    fn properties(&self, props: Operand) -> BTreeMap<String, Operand> {
        match props {
            Operand::Dict(dict) => dict,
            Operand::Name(name) => match self.lookup(b"Properties", &name) {
                Some((_, obj)) => match pdfobj::to_operand(self.doc, obj, 0) {
                    Operand::Dict(dict) => dict,
                    _ => BTreeMap::new(),
                },
                None => {
                    debug!("Property list {name} not found");
                    BTreeMap::new()
                }
            },
            _ => BTreeMap::new(),
        }
    }

    fn push_segment(&mut self, op: char, points: &[Point]) {
        let ctm = self.ctm;
        self.path.push(PathSegment::new(
            op,
            points.iter().map(|&p| ctm.apply(p)).collect(),
        ));
    }

    fn paint_path(
        &mut self,
        objects: &mut Vec<ContentObject>,
        stroke: bool,
        fill: bool,
        evenodd: bool,
        close: bool,
    ) {
        if close {
            self.push_segment('h', &[]);
        }
        let segments = std::mem::take(&mut self.path);
        if segments.is_empty() {
            return;
        }
        objects.push(ContentObject::Path(PathObject {
            state: self.object_state(),
            segments,
            stroke,
            fill,
            evenodd,
        }));
    }

    fn show_text(&mut self, elements: Vec<TextElement>, objects: &mut Vec<ContentObject>) {
        let font = match &self.textstate.font {
            Some(font) => font.clone(),
            None => {
                warn!("Text shown without a font");
                self.default_font.clone()
            }
        };
        let state = self.object_state();
        let mcid = state.mcid();
        let tag = state.tag().map(String::from);
        let ts = &mut self.textstate;
        let fontsize = ts.fontsize;
        let th = ts.scaling / 100.0;
        let text_matrix = ts.matrix;
        let mut glyphs = Vec::new();
        let mut raw = Vec::new();

        for element in elements {
            match element {
                TextElement::Spacing(adjust) => {
                    let d = -adjust / 1000.0 * fontsize;
                    ts.matrix = if font.vertical {
                        ts.matrix.translate(0.0, d)
                    } else {
                        ts.matrix.translate(d * th, 0.0)
                    };
                }
                TextElement::Text(bytes) => {
                    raw.extend_from_slice(&bytes);
                    for (code, cid) in font.decode(&bytes) {
                        let tm_ctm = ts.matrix.multiply(&self.ctm);
                        let trm = Matrix::new(fontsize * th, 0.0, 0.0, fontsize, 0.0, ts.rise)
                            .multiply(&tm_ctm);
                        let mut spacing = ts.charspace;
                        if code == [32] {
                            spacing += ts.wordspace;
                        }

                        let (advance, em_box) = if font.vertical {
                            let vm = font.vdisp(cid);
                            let top = 1.0 - vm.vy;
                            (
                                Point::new(0.0, vm.w1 * fontsize + spacing),
                                Rect::new(-vm.vx, top + vm.w1, -vm.vx + 1.0, top),
                            )
                        } else {
                            let width = font.hdisp(cid);
                            (
                                Point::new((width * fontsize + spacing) * th, 0.0),
                                Rect::new(0.0, font.descent, width, font.ascent),
                            )
                        };

                        let oriented = if self.y_down {
                            tm_ctm.multiply(&FLIP_Y)
                        } else {
                            tm_ctm
                        };
                        let [a, b, c, d, _, _] = oriented.0;
                        let vertical_unit = tm_ctm.apply_norm(Point::new(0.0, 1.0));

                        glyphs.push(GlyphObject {
                            text: font.unicode(&code),
                            cid,
                            code,
                            origin: trm.apply(Point::origin()),
                            displacement: tm_ctm.apply_norm(advance),
                            bbox: em_box.transform(&trm),
                            fontname: font.basefont.clone(),
                            size: fontsize.abs() * vertical_unit.x.hypot(vertical_unit.y),
                            matrix: trm,
                            adv: if font.vertical { advance.y } else { advance.x },
                            upright: 0.0 < a * d * th && b * c <= 0.0,
                            vertical: font.vertical,
                            render_mode: ts.render_mode,
                            page_index: self.page_index,
                            mcid,
                            tag: tag.clone(),
                        });
                        ts.matrix = ts.matrix.translate(advance.x, advance.y);
                    }
                }
            }
        }

        objects.push(ContentObject::Text(TextObject {
            state,
            glyphs,
            fontname: font.basefont.clone(),
            fontsize,
            render_mode: self.textstate.render_mode,
            text_matrix,
            raw,
        }));
    }

    fn inline_image(&self, dict: &BTreeMap<String, Operand>) -> ImageObject {
        let get = |long: &str, short: &str| dict.get(long).or_else(|| dict.get(short));
        let number = |long: &str, short: &str| {
            get(long, short)
                .and_then(Operand::as_number)
                .unwrap_or(0.0) as u32
        };
        let filters = match get("Filter", "F") {
            Some(Operand::Name(name)) => vec![name.clone()],
            Some(Operand::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_name().map(String::from))
                .collect(),
            _ => Vec::new(),
        };
        ImageObject {
            state: self.object_state(),
            name: None,
            stream_id: None,
            width: number("Width", "W"),
            height: number("Height", "H"),
            bits_per_component: number("BitsPerComponent", "BPC"),
            image_mask: matches!(get("ImageMask", "IM"), Some(Operand::Bool(true))),
            colorspace: get("ColorSpace", "CS").and_then(|cs| match cs {
                Operand::Name(name) => Some(
                    ColorSpace::predefined(name)
                        .map(|space| space.name)
                        .unwrap_or_else(|| name.clone()),
                ),
                Operand::Array(items) => items.first().and_then(|i| i.as_name().map(String::from)),
                _ => None,
            }),
            filters,
        }
    }

    fn paint_xobject(&mut self, name: &str, objects: &mut Vec<ContentObject>) {
        let Some((id, Object::Stream(stream))) = self.lookup(b"XObject", name) else {
            warn!("XObject {name} not found");
            return;
        };
        let doc = self.doc;
        let dict = &stream.dict;
        match pdfobj::get_name(doc, dict, b"Subtype").as_deref() {
            Some("Image") => {
                let number = |key: &[u8]| pdfobj::get_number(doc, dict, key).unwrap_or(0.0) as u32;
                let filters = match pdfobj::get(doc, dict, b"Filter") {
                    Some(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
                    Some(Object::Array(items)) => {
                        items.iter().filter_map(pdfobj::as_name).collect()
                    }
                    _ => Vec::new(),
                };
                let colorspace = pdfobj::get(doc, dict, b"ColorSpace")
                    .map(|obj| colorspace_from_object(doc, obj).name);
                objects.push(ContentObject::Image(ImageObject {
                    state: self.object_state(),
                    name: Some(name.to_string()),
                    stream_id: id,
                    width: number(b"Width"),
                    height: number(b"Height"),
                    bits_per_component: number(b"BitsPerComponent"),
                    image_mask: matches!(
                        pdfobj::get(doc, dict, b"ImageMask"),
                        Some(Object::Boolean(true))
                    ),
                    colorspace,
                    filters,
                }));
            }
            Some("Form") => {
                if self.xobject_stack.len() >= MAX_XOBJECT_DEPTH {
                    warn!("XObject {name} nested too deeply, skipping");
                    return;
                }
                if let Some(id) = id {
                    if self.xobject_stack.contains(&id) {
                        warn!("XObject {name} paints itself, skipping");
                        return;
                    }
                }
                let matrix = pdfobj::get_matrix(doc, dict, b"Matrix").unwrap_or(Matrix::IDENTITY);
                let form_bbox = pdfobj::get_rect(doc, dict, b"BBox").unwrap_or(Rect::NONE);
                let state = self.object_state();

                // Forms run with their own q/Q, path and text state
                let saved = SavedState {
                    gstate: self.gstate.clone(),
                    ctm: self.ctm,
                    textstate: self.textstate.clone(),
                };
                let saved_stack = std::mem::take(&mut self.stack);
                let saved_path = std::mem::take(&mut self.path);
                let resources = pdfobj::get_dict(doc, dict, b"Resources")
                    .or_else(|| self.resources.last().copied());
                let pushed = resources.is_some();
                if let Some(resources) = resources {
                    self.resources.push(resources);
                }
                if let Some(id) = id {
                    self.xobject_stack.push(id);
                }
                self.ctm = matrix.multiply(&self.ctm);

                let mut children = Vec::new();
                for operation in ContentParser::parse_lenient(&pdfobj::stream_data(stream)) {
                    self.execute(operation, &mut children);
                }

                if id.is_some() {
                    self.xobject_stack.pop();
                }
                if pushed {
                    self.resources.pop();
                }
                self.path = saved_path;
                self.stack = saved_stack;
                self.gstate = saved.gstate;
                self.ctm = saved.ctm;
                self.textstate = saved.textstate;

                objects.push(ContentObject::XObject(XObjectObject {
                    state,
                    name: name.to_string(),
                    stream_id: id,
                    matrix,
                    form_bbox,
                    children,
                }));
            }
            other => debug!("Ignoring XObject {name} of subtype {other:?}"),
        }
    }
}

/// Color space from a resource value (name or array)
fn colorspace_from_object(doc: &Document, obj: &Object) -> ColorSpace {
    match obj {
        Object::Name(name) => {
            let name = String::from_utf8_lossy(name);
            ColorSpace::predefined(&name).unwrap_or_else(|| ColorSpace::new(name, 1))
        }
        Object::Array(items) => {
            let family = items
                .first()
                .and_then(|obj| pdfobj::resolve(doc, obj))
                .and_then(pdfobj::as_name)
                .unwrap_or_default();
            let second = items.get(1).and_then(|obj| pdfobj::resolve(doc, obj));
            let ncomponents = match family.as_str() {
                "ICCBased" => second
                    .and_then(pdfobj::as_dict)
                    .and_then(|d| pdfobj::get_number(doc, d, b"N"))
                    .map(|n| n as usize)
                    .unwrap_or(3),
                "DeviceN" => match second {
                    Some(Object::Array(names)) => names.len(),
                    _ => 1,
                },
                "CalRGB" | "Lab" => 3,
                _ => 1,
            };
            ColorSpace::new(family, ncomponents)
        }
        _ => ColorSpace::default(),
    }
}

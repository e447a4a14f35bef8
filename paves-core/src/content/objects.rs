//! Content objects produced by interpreting a page
//!
//! Every object records the page it came from, the graphics state and
//! CTM in effect when it was painted, and the marked content stack
//! around it. Coordinates are in the device space chosen for the
//! document (see [`crate::Space`]).

use super::state::{GraphicState, MarkedContent};
use crate::geometry::{get_bound, get_bound_rects, Matrix, Point, Rect};
use lopdf::ObjectId;

/// State shared by all content objects
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectState {
    pub page_index: usize,
    pub gstate: GraphicState,
    pub ctm: Matrix,
    pub mcstack: Vec<MarkedContent>,
}

impl ObjectState {
    /// Innermost marked content section with an MCID
    pub fn mcid(&self) -> Option<i64> {
        self.mcstack.iter().rev().find_map(|mc| mc.mcid)
    }

    /// Tag of the innermost marked content section
    pub fn tag(&self) -> Option<&str> {
        self.mcstack.last().map(|mc| mc.tag.as_str())
    }
}

/// A single glyph of a text object
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphObject {
    /// Unicode text, if the font allows it to be known
    pub text: Option<String>,
    pub cid: u32,
    pub code: Vec<u8>,
    /// Glyph origin in device space
    pub origin: Point,
    /// Vector to the next glyph origin in device space
    pub displacement: Point,
    pub bbox: Rect,
    pub fontname: String,
    /// Font size scaled to device space
    pub size: f64,
    /// Glyph rendering matrix (font size, text matrix and CTM)
    pub matrix: Matrix,
    /// Advance in text space
    pub adv: f64,
    pub upright: bool,
    pub vertical: bool,
    pub render_mode: i64,
    pub page_index: usize,
    pub mcid: Option<i64>,
    pub tag: Option<String>,
}

impl GlyphObject {
    /// Where the next glyph would start
    pub fn next_origin(&self) -> Point {
        Point::new(
            self.origin.x + self.displacement.x,
            self.origin.y + self.displacement.y,
        )
    }

    pub fn is_space(&self) -> bool {
        self.text.as_deref() == Some(" ")
    }
}

/// Glyphs painted by one text showing operator
#[derive(Debug, Clone, PartialEq)]
pub struct TextObject {
    pub state: ObjectState,
    pub glyphs: Vec<GlyphObject>,
    pub fontname: String,
    pub fontsize: f64,
    pub render_mode: i64,
    /// Text matrix before the operator
    pub text_matrix: Matrix,
    /// Raw string operand(s)
    pub raw: Vec<u8>,
}

impl TextObject {
    pub fn chars(&self) -> String {
        self.glyphs
            .iter()
            .filter_map(|g| g.text.as_deref())
            .collect()
    }

    pub fn bbox(&self) -> Rect {
        if self.glyphs.is_empty() {
            let origin = self.text_matrix.multiply(&self.state.ctm).apply(Point::origin());
            return Rect::new(origin.x, origin.y, origin.x, origin.y);
        }
        get_bound_rects(self.glyphs.iter().map(|g| g.bbox))
    }
}

/// One path construction segment, points in device space
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    /// Operator: one of `m l c v y h`
    pub op: char,
    pub points: Vec<Point>,
}

impl PathSegment {
    pub fn new(op: char, points: Vec<Point>) -> Self {
        Self { op, points }
    }
}

/// A painted path
#[derive(Debug, Clone, PartialEq)]
pub struct PathObject {
    pub state: ObjectState,
    pub segments: Vec<PathSegment>,
    pub stroke: bool,
    pub fill: bool,
    pub evenodd: bool,
}

impl PathObject {
    pub fn bbox(&self) -> Rect {
        get_bound(self.segments.iter().flat_map(|s| s.points.iter().copied()))
    }

    /// Operator string, e.g. `"mlllh"`
    pub fn shape(&self) -> String {
        self.segments.iter().map(|s| s.op).collect()
    }

    /// Split into one path per `m` operator.
    pub fn subpaths(&self) -> Vec<PathObject> {
        let mut result: Vec<PathObject> = Vec::new();
        for segment in &self.segments {
            match result.last_mut() {
                Some(current) if segment.op != 'm' => current.segments.push(segment.clone()),
                _ => result.push(PathObject {
                    state: self.state.clone(),
                    segments: vec![segment.clone()],
                    stroke: self.stroke,
                    fill: self.fill,
                    evenodd: self.evenodd,
                }),
            }
        }
        result
    }
}

/// An image XObject or inline image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageObject {
    pub state: ObjectState,
    /// Resource name, `None` for inline images
    pub name: Option<String>,
    pub stream_id: Option<ObjectId>,
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u32,
    pub image_mask: bool,
    pub colorspace: Option<String>,
    pub filters: Vec<String>,
}

impl ImageObject {
    /// The unit square through the CTM
    pub fn bbox(&self) -> Rect {
        Rect::new(0.0, 0.0, 1.0, 1.0).transform(&self.state.ctm)
    }

    pub fn srcsize(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A form XObject and the objects it paints
#[derive(Debug, Clone, PartialEq)]
pub struct XObjectObject {
    pub state: ObjectState,
    pub name: String,
    pub stream_id: Option<ObjectId>,
    /// Form matrix
    pub matrix: Matrix,
    /// Form bounding box in form space
    pub form_bbox: Rect,
    pub children: Vec<ContentObject>,
}

impl XObjectObject {
    /// The form's BBox in device space
    pub fn bbox(&self) -> Rect {
        self.form_bbox
            .transform(&self.matrix.multiply(&self.state.ctm))
    }
}

/// Anything painted on a page
#[derive(Debug, Clone, PartialEq)]
pub enum ContentObject {
    Text(TextObject),
    Path(PathObject),
    Image(ImageObject),
    XObject(XObjectObject),
}

impl ContentObject {
    pub fn state(&self) -> &ObjectState {
        match self {
            ContentObject::Text(obj) => &obj.state,
            ContentObject::Path(obj) => &obj.state,
            ContentObject::Image(obj) => &obj.state,
            ContentObject::XObject(obj) => &obj.state,
        }
    }

    pub fn bbox(&self) -> Rect {
        match self {
            ContentObject::Text(obj) => obj.bbox(),
            ContentObject::Path(obj) => obj.bbox(),
            ContentObject::Image(obj) => obj.bbox(),
            ContentObject::XObject(obj) => obj.bbox(),
        }
    }

    pub fn page_index(&self) -> usize {
        self.state().page_index
    }

    pub fn mcid(&self) -> Option<i64> {
        self.state().mcid()
    }

    pub fn object_type(&self) -> &'static str {
        match self {
            ContentObject::Text(_) => "text",
            ContentObject::Path(_) => "path",
            ContentObject::Image(_) => "image",
            ContentObject::XObject(_) => "xobject",
        }
    }

    /// This object followed by everything nested in it, depth first.
    pub fn flatten(&self) -> Vec<&ContentObject> {
        let mut result = vec![self];
        if let ContentObject::XObject(xobj) = self {
            for child in &xobj.children {
                result.extend(child.flatten());
            }
        }
        result
    }
}

//! Layout items
//!
//! These mirror the classic pdfminer layout objects, and their
//! `Display` output follows pdfminer's `repr` so results can be
//! compared line by line.

use crate::content::{Color, ColorSpace, DashPattern, PathSegment};
use crate::geometry::{get_bound, Matrix, Point, Rect};
use std::fmt;

/// Quote a string the way Python's `repr` does
pub(crate) fn py_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn matrix_str(m: &Matrix) -> String {
    m.to_string()
}

/// A character with its box
#[derive(Debug, Clone, PartialEq)]
pub struct LTChar {
    /// Unicode text, or `(cid:N)` when unknown
    pub text: String,
    pub bbox: Rect,
    /// Glyph rendering matrix
    pub matrix: Matrix,
    pub fontname: String,
    pub size: f64,
    pub adv: f64,
    pub upright: bool,
    pub ncs: ColorSpace,
    pub ncolor: Color,
    pub scolor: Color,
    pub mcid: Option<i64>,
}

impl fmt::Display for LTChar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<LTChar {} matrix={} font={} adv={:?} text={}>",
            self.bbox,
            matrix_str(&self.matrix),
            py_repr(&self.fontname),
            self.adv,
            py_repr(&self.text)
        )
    }
}

/// A virtual character inserted by layout analysis (space or newline)
#[derive(Debug, Clone, PartialEq)]
pub struct LTAnno {
    pub text: String,
}

impl LTAnno {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl fmt::Display for LTAnno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<LTAnno {}>", py_repr(&self.text))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    /// A single straight segment
    Line,
    /// A closed axis-aligned rectangle
    Rect,
    Curve,
}

/// A painted path: line, rectangle or generic curve
#[derive(Debug, Clone, PartialEq)]
pub struct LTCurve {
    pub kind: CurveKind,
    pub bbox: Rect,
    pub pts: Vec<Point>,
    pub linewidth: f64,
    pub stroke: bool,
    pub fill: bool,
    pub evenodd: bool,
    pub scolor: Color,
    pub ncolor: Color,
    /// Segments of the subpath in device space
    pub original_path: Vec<PathSegment>,
    pub dash: DashPattern,
}

impl LTCurve {
    pub(crate) fn new(kind: CurveKind, pts: Vec<Point>) -> Self {
        Self {
            kind,
            bbox: get_bound(pts.iter().copied()),
            pts,
            linewidth: 1.0,
            stroke: false,
            fill: false,
            evenodd: false,
            scolor: Color::default(),
            ncolor: Color::default(),
            original_path: Vec::new(),
            dash: DashPattern::default(),
        }
    }

    /// Points as `x,y,x,y...`
    pub fn pts_str(&self) -> String {
        self.pts
            .iter()
            .map(|p| format!("{:.3},{:.3}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn class_name(&self) -> &'static str {
        match self.kind {
            CurveKind::Line => "LTLine",
            CurveKind::Rect => "LTRect",
            CurveKind::Curve => "LTCurve",
        }
    }
}

impl fmt::Display for LTCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", self.class_name(), self.bbox)
    }
}

/// An image
#[derive(Debug, Clone, PartialEq)]
pub struct LTImage {
    pub name: String,
    pub bbox: Rect,
    pub srcsize: (u32, u32),
    pub imagemask: bool,
    pub bits: u32,
    pub colorspace: Vec<String>,
}

impl fmt::Display for LTImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<LTImage({}) {} ({}, {})>",
            self.name, self.bbox, self.srcsize.0, self.srcsize.1
        )
    }
}

/// Area painted by a form XObject or an image
#[derive(Debug, Clone, PartialEq)]
pub struct LTFigure {
    pub name: String,
    /// Bounding box, already in device space
    pub bbox: Rect,
    pub matrix: Matrix,
    pub items: Vec<LTItem>,
    pub groups: Option<Vec<TextGroupElement>>,
}

impl fmt::Display for LTFigure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<LTFigure({}) {} matrix={}>",
            self.name,
            self.bbox,
            matrix_str(&self.matrix)
        )
    }
}

/// Element of a text line
#[derive(Debug, Clone, PartialEq)]
pub enum TextLineElement {
    Char(LTChar),
    Anno(LTAnno),
}

impl TextLineElement {
    pub fn text(&self) -> &str {
        match self {
            TextLineElement::Char(c) => &c.text,
            TextLineElement::Anno(a) => &a.text,
        }
    }
}

/// Characters aligned horizontally or vertically
#[derive(Debug, Clone, PartialEq)]
pub struct LTTextLine {
    pub vertical: bool,
    pub bbox: Rect,
    pub items: Vec<TextLineElement>,
    word_margin: f64,
    /// Trailing edge of the last character: x1, or y0 when vertical
    edge: f64,
}

impl LTTextLine {
    pub fn new(vertical: bool, word_margin: f64) -> Self {
        Self {
            vertical,
            bbox: Rect::NONE,
            items: Vec::new(),
            word_margin,
            edge: if vertical {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            },
        }
    }

    /// Add a character, inserting a space after a wide enough gap
    pub fn add(&mut self, c: LTChar) {
        if self.word_margin != 0.0 {
            let margin = self.word_margin * c.bbox.width().max(c.bbox.height());
            let gap = if self.vertical {
                c.bbox.y1 + margin < self.edge
            } else {
                self.edge < c.bbox.x0 - margin
            };
            if gap {
                self.items.push(TextLineElement::Anno(LTAnno::new(" ")));
            }
        }
        self.edge = if self.vertical { c.bbox.y0 } else { c.bbox.x1 };
        self.bbox = self.bbox.union(&c.bbox);
        self.items.push(TextLineElement::Char(c));
    }

    /// Terminate the line
    pub(crate) fn analyze(&mut self) {
        self.items.push(TextLineElement::Anno(LTAnno::new("\n")));
    }

    pub fn text(&self) -> String {
        self.items.iter().map(TextLineElement::text).collect()
    }

    pub fn chars(&self) -> impl Iterator<Item = &LTChar> {
        self.items.iter().filter_map(|item| match item {
            TextLineElement::Char(c) => Some(c),
            TextLineElement::Anno(_) => None,
        })
    }

    /// No extent, or nothing but whitespace
    pub fn is_empty(&self) -> bool {
        let text = self.text();
        self.bbox.width() <= 0.0
            || self.bbox.height() <= 0.0
            || (!text.is_empty() && text.chars().all(char::is_whitespace))
    }

    pub fn class_name(&self) -> &'static str {
        if self.vertical {
            "LTTextLineVertical"
        } else {
            "LTTextLineHorizontal"
        }
    }
}

impl fmt::Display for LTTextLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {} {}>", self.class_name(), self.bbox, py_repr(&self.text()))
    }
}

/// Neighbouring lines grouped together
#[derive(Debug, Clone, PartialEq)]
pub struct LTTextBox {
    pub vertical: bool,
    pub bbox: Rect,
    /// Reading order index, -1 until assigned
    pub index: i64,
    pub lines: Vec<LTTextLine>,
}

impl LTTextBox {
    pub fn new(vertical: bool) -> Self {
        Self {
            vertical,
            bbox: Rect::NONE,
            index: -1,
            lines: Vec::new(),
        }
    }

    pub fn add(&mut self, line: LTTextLine) {
        self.bbox = self.bbox.union(&line.bbox);
        self.lines.push(line);
    }

    pub fn is_empty(&self) -> bool {
        self.bbox.width() <= 0.0 || self.bbox.height() <= 0.0
    }

    /// Terminate lines and sort them in reading order
    pub(crate) fn analyze(&mut self) {
        for line in &mut self.lines {
            line.analyze();
        }
        if self.vertical {
            self.lines.sort_by(|a, b| b.bbox.x1.total_cmp(&a.bbox.x1));
        } else {
            self.lines.sort_by(|a, b| b.bbox.y1.total_cmp(&a.bbox.y1));
        }
    }

    pub fn text(&self) -> String {
        self.lines.iter().map(LTTextLine::text).collect()
    }

    pub fn writing_mode(&self) -> &'static str {
        if self.vertical {
            "tb-rl"
        } else {
            "lr-tb"
        }
    }

    pub fn class_name(&self) -> &'static str {
        if self.vertical {
            "LTTextBoxVertical"
        } else {
            "LTTextBoxHorizontal"
        }
    }
}

impl fmt::Display for LTTextBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}({}) {} {}>",
            self.class_name(),
            self.index,
            self.bbox,
            py_repr(&self.text())
        )
    }
}

/// Reading direction of a text group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupFlow {
    /// Left to right, top to bottom
    Lrtb,
    /// Top to bottom, right to left
    Tbrl,
}

/// Hierarchical grouping of text boxes
#[derive(Debug, Clone, PartialEq)]
pub struct LTTextGroup {
    pub flow: GroupFlow,
    pub bbox: Rect,
    pub elements: Vec<TextGroupElement>,
}

impl fmt::Display for LTTextGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.flow {
            GroupFlow::Lrtb => "LTTextGroupLRTB",
            GroupFlow::Tbrl => "LTTextGroupTBRL",
        };
        write!(f, "<{} {}>", name, self.bbox)
    }
}

/// Member of a text group
#[derive(Debug, Clone, PartialEq)]
pub enum TextGroupElement {
    /// A text box of the container, by its index
    TextBox(usize),
    Group(LTTextGroup),
}

impl TextGroupElement {
    /// Text box indices in group order
    pub fn textbox_indices(&self) -> Vec<usize> {
        match self {
            TextGroupElement::TextBox(index) => vec![*index],
            TextGroupElement::Group(group) => group
                .elements
                .iter()
                .flat_map(TextGroupElement::textbox_indices)
                .collect(),
        }
    }
}

/// Anything in a layout container
#[derive(Debug, Clone, PartialEq)]
pub enum LTItem {
    Char(LTChar),
    Anno(LTAnno),
    Curve(LTCurve),
    Image(LTImage),
    Figure(LTFigure),
    TextLine(LTTextLine),
    TextBox(LTTextBox),
}

impl LTItem {
    /// Bounding box, `None` for virtual characters
    pub fn bbox(&self) -> Option<Rect> {
        match self {
            LTItem::Char(c) => Some(c.bbox),
            LTItem::Anno(_) => None,
            LTItem::Curve(c) => Some(c.bbox),
            LTItem::Image(i) => Some(i.bbox),
            LTItem::Figure(fig) => Some(fig.bbox),
            LTItem::TextLine(line) => Some(line.bbox),
            LTItem::TextBox(tb) => Some(tb.bbox),
        }
    }

    pub fn text(&self) -> Option<String> {
        match self {
            LTItem::Char(c) => Some(c.text.clone()),
            LTItem::Anno(a) => Some(a.text.clone()),
            LTItem::TextLine(line) => Some(line.text()),
            LTItem::TextBox(tb) => Some(tb.text()),
            _ => None,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            LTItem::Char(_) => "LTChar",
            LTItem::Anno(_) => "LTAnno",
            LTItem::Curve(c) => c.class_name(),
            LTItem::Image(_) => "LTImage",
            LTItem::Figure(_) => "LTFigure",
            LTItem::TextLine(line) => line.class_name(),
            LTItem::TextBox(tb) => tb.class_name(),
        }
    }
}

impl fmt::Display for LTItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LTItem::Char(c) => c.fmt(f),
            LTItem::Anno(a) => a.fmt(f),
            LTItem::Curve(c) => c.fmt(f),
            LTItem::Image(i) => i.fmt(f),
            LTItem::Figure(fig) => fig.fmt(f),
            LTItem::TextLine(line) => line.fmt(f),
            LTItem::TextBox(tb) => tb.fmt(f),
        }
    }
}

/// A page after layout extraction
#[derive(Debug, Clone, PartialEq)]
pub struct LTPage {
    /// One-based page number
    pub pageid: usize,
    pub bbox: Rect,
    pub rotate: i64,
    pub items: Vec<LTItem>,
    /// Top-level text groups, when boxes were ordered by flow
    pub groups: Option<Vec<TextGroupElement>>,
}

impl LTPage {
    pub fn iter(&self) -> std::slice::Iter<'_, LTItem> {
        self.items.iter()
    }

    pub fn textboxes(&self) -> impl Iterator<Item = &LTTextBox> {
        self.items.iter().filter_map(|item| match item {
            LTItem::TextBox(tb) => Some(tb),
            _ => None,
        })
    }

    /// Text of all text boxes in reading order
    pub fn text(&self) -> String {
        self.textboxes().map(LTTextBox::text).collect()
    }
}

impl<'a> IntoIterator for &'a LTPage {
    type Item = &'a LTItem;
    type IntoIter = std::slice::Iter<'a, LTItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for LTPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<LTPage({}) {} rotate={}>", self.pageid, self.bbox, self.rotate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ltchar(text: &str, bbox: Rect) -> LTChar {
        LTChar {
            text: text.to_string(),
            bbox,
            matrix: Matrix::IDENTITY,
            fontname: "Helvetica".to_string(),
            size: bbox.height(),
            adv: bbox.width(),
            upright: true,
            ncs: ColorSpace::default(),
            ncolor: Color::default(),
            scolor: Color::default(),
            mcid: None,
        }
    }

    #[test]
    fn test_py_repr() {
        assert_eq!(py_repr("abc"), "'abc'");
        assert_eq!(py_repr("a\nb"), "'a\\nb'");
        assert_eq!(py_repr("it's"), "\"it's\"");
        assert_eq!(py_repr("'\""), "'\\'\"'");
    }

    #[test]
    fn test_text_line_inserts_spaces() {
        let mut line = LTTextLine::new(false, 0.1);
        line.add(ltchar("a", Rect::new(0.0, 0.0, 10.0, 10.0)));
        line.add(ltchar("b", Rect::new(10.5, 0.0, 20.0, 10.0)));
        line.add(ltchar("c", Rect::new(25.0, 0.0, 35.0, 10.0)));
        assert_eq!(line.text(), "ab c");
        assert_eq!(line.bbox, Rect::new(0.0, 0.0, 35.0, 10.0));
        line.analyze();
        assert_eq!(
            line.to_string(),
            "<LTTextLineHorizontal 0.000,0.000,35.000,10.000 'ab c\\n'>"
        );
    }

    #[test]
    fn test_whitespace_line_is_empty() {
        let mut line = LTTextLine::new(false, 0.1);
        line.add(ltchar(" ", Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(line.is_empty());
    }

    #[test]
    fn test_display() {
        let curve = LTCurve::new(
            CurveKind::Rect,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 5.0)],
        );
        assert_eq!(curve.to_string(), "<LTRect 0.000,0.000,10.000,5.000>");
        let page = LTPage {
            pageid: 1,
            bbox: Rect::new(0.0, 0.0, 612.0, 792.0),
            rotate: 0,
            items: Vec::new(),
            groups: None,
        };
        assert_eq!(page.to_string(), "<LTPage(1) 0.000,0.000,612.000,792.000 rotate=0>");
        let c = ltchar("x", Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(
            c.to_string(),
            "<LTChar 1.000,2.000,3.000,4.000 matrix=[1.00,0.00,0.00,1.00, (0.00,0.00)] font='Helvetica' adv=2.0 text='x'>"
        );
    }
}

//! pdfminer-compatible layout analysis
//!
//! [`extract_page`] turns the content objects of a page into the layout
//! items pdfminer produces (`LTChar`, `LTFigure`, `LTLine`...) and,
//! given [`LAParams`], groups characters into lines, lines into text
//! boxes and text boxes into a reading order.
//!
//! For output that matches pdfminer coordinates, open the document with
//! [`Space::Page`](crate::Space::Page).

mod analysis;
pub mod layout;
pub mod params;
pub mod plane;

pub use layout::{
    CurveKind, GroupFlow, LTAnno, LTChar, LTCurve, LTFigure, LTImage, LTItem, LTPage, LTTextBox,
    LTTextGroup, LTTextLine, TextGroupElement, TextLineElement,
};
pub use params::LAParams;
pub use plane::Plane;

use crate::content::{ContentObject, ImageObject, PathObject, TextObject, XObjectObject};
use crate::document::{Page, PdfSource};
use crate::error::Result;
use crate::geometry::{Point, Rect};
use tracing::debug;

fn process_text(text: &TextObject) -> Vec<LTItem> {
    let gstate = &text.state.gstate;
    text.glyphs
        .iter()
        .map(|glyph| {
            LTItem::Char(LTChar {
                text: glyph
                    .text
                    .clone()
                    .unwrap_or_else(|| format!("(cid:{})", glyph.cid)),
                bbox: glyph.bbox,
                matrix: glyph.matrix,
                fontname: glyph.fontname.clone(),
                size: if glyph.vertical {
                    glyph.bbox.width()
                } else {
                    glyph.bbox.height()
                },
                adv: glyph.adv,
                upright: glyph.upright,
                ncs: gstate.ncs.clone(),
                ncolor: gstate.ncolor.clone(),
                scolor: gstate.scolor.clone(),
                mcid: glyph.mcid,
            })
        })
        .collect()
}

/// Classify one subpath as a line, a rectangle or a curve.
fn process_subpath(path: &PathObject) -> Option<LTCurve> {
    let mut shape = String::new();
    let mut pts: Vec<Point> = Vec::new();
    for segment in &path.segments {
        shape.push(segment.op);
        if segment.op == 'h' {
            pts.push(*pts.first()?);
        } else {
            pts.push(*segment.points.last()?);
        }
    }
    // redundant "l" back to the start before "h"
    if shape.len() > 3 && shape.ends_with("lh") && pts[pts.len() - 2] == pts[0] {
        shape.truncate(shape.len() - 2);
        shape.push('h');
        pts.pop();
    }
    let mut curve = match shape.as_str() {
        "ml" | "mlh" => LTCurve::new(CurveKind::Line, vec![pts[0], pts[1]]),
        "mlllh" | "mllll" => {
            let [p0, p1, p2, p3, p4] = [pts[0], pts[1], pts[2], pts[3], pts[4]];
            let closed = p0 == p4;
            let square = (p0.x == p1.x && p1.y == p2.y && p2.x == p3.x && p3.y == p0.y)
                || (p0.y == p1.y && p1.x == p2.x && p2.y == p3.y && p3.x == p0.x);
            if closed && square {
                let r = Rect::from_corners(p0, p2);
                LTCurve::new(
                    CurveKind::Rect,
                    vec![
                        Point::new(r.x0, r.y0),
                        Point::new(r.x1, r.y0),
                        Point::new(r.x1, r.y1),
                        Point::new(r.x0, r.y1),
                    ],
                )
            } else {
                LTCurve::new(CurveKind::Curve, pts)
            }
        }
        _ => LTCurve::new(CurveKind::Curve, pts),
    };
    let gstate = &path.state.gstate;
    curve.linewidth = gstate.linewidth;
    curve.stroke = path.stroke;
    curve.fill = path.fill;
    curve.evenodd = path.evenodd;
    curve.scolor = gstate.scolor.clone();
    curve.ncolor = gstate.ncolor.clone();
    curve.original_path = path.segments.clone();
    curve.dash = gstate.dash.clone();
    Some(curve)
}

fn process_path(path: &PathObject) -> Vec<LTItem> {
    path.subpaths()
        .iter()
        .filter_map(process_subpath)
        .map(LTItem::Curve)
        .collect()
}

/// Images get a figure of their own
fn process_image(image: &ImageObject) -> Vec<LTItem> {
    let name = image.name.clone().unwrap_or_else(|| "inline".to_string());
    let bbox = image.bbox();
    let ltimage = LTImage {
        name: name.clone(),
        bbox,
        srcsize: image.srcsize(),
        imagemask: image.image_mask,
        bits: image.bits_per_component,
        colorspace: image.colorspace.iter().cloned().collect(),
    };
    vec![LTItem::Figure(LTFigure {
        name,
        bbox,
        matrix: image.state.ctm,
        items: vec![LTItem::Image(ltimage)],
        groups: None,
    })]
}

fn process_xobject(xobj: &XObjectObject) -> Vec<LTItem> {
    vec![LTItem::Figure(LTFigure {
        name: xobj.name.clone(),
        bbox: xobj.bbox(),
        matrix: xobj.state.ctm,
        items: xobj.children.iter().flat_map(process_object).collect(),
        groups: None,
    })]
}

fn process_object(obj: &ContentObject) -> Vec<LTItem> {
    match obj {
        ContentObject::Text(text) => process_text(text),
        ContentObject::Path(path) => process_path(path),
        ContentObject::Image(image) => process_image(image),
        ContentObject::XObject(xobj) => process_xobject(xobj),
    }
}

/// Extract the layout of a page, with analysis if `laparams` is given.
pub fn extract_page(page: &Page<'_>, laparams: Option<&LAParams>) -> Result<LTPage> {
    if let Some(params) = laparams {
        params.validate()?;
    }
    let mediabox = page.mediabox();
    let ctm = page.ctm();
    let p0 = ctm.apply(Point::new(mediabox.x0, mediabox.y0));
    let p1 = ctm.apply(Point::new(mediabox.x1, mediabox.y1));
    let bbox = Rect::new(0.0, 0.0, (p0.x - p1.x).abs(), (p0.y - p1.y).abs());

    let items: Vec<LTItem> = page.objects()?.iter().flat_map(process_object).collect();
    debug!("Page {} has {} layout items", page.index(), items.len());
    let (items, groups) = match laparams {
        Some(params) => analysis::analyze_items(items, bbox, params),
        None => (items, None),
    };
    Ok(LTPage {
        pageid: page.index() + 1,
        bbox,
        rotate: page.rotate(),
        items,
        groups,
    })
}

/// Extract the layout of every page of a document, page list or page.
pub fn extract<'a>(
    source: impl Into<PdfSource<'a>>,
    laparams: Option<&LAParams>,
) -> Result<Vec<LTPage>> {
    source
        .into()
        .with_pages(|page| extract_page(&page, laparams))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{GraphicState, ObjectState, PathSegment};
    use crate::geometry::Matrix;

    fn path(segments: Vec<(char, Vec<(f64, f64)>)>) -> PathObject {
        PathObject {
            state: ObjectState {
                page_index: 0,
                gstate: GraphicState::default(),
                ctm: Matrix::IDENTITY,
                mcstack: Vec::new(),
            },
            segments: segments
                .into_iter()
                .map(|(op, pts)| PathSegment::new(op, pts.into_iter().map(Point::from).collect()))
                .collect(),
            stroke: true,
            fill: false,
            evenodd: false,
        }
    }

    #[test]
    fn test_rectangle_from_re() {
        let p = path(vec![
            ('m', vec![(10.0, 10.0)]),
            ('l', vec![(50.0, 10.0)]),
            ('l', vec![(50.0, 30.0)]),
            ('l', vec![(10.0, 30.0)]),
            ('h', vec![]),
        ]);
        let items = process_path(&p);
        assert_eq!(items.len(), 1);
        let LTItem::Curve(curve) = &items[0] else {
            panic!("expected a curve");
        };
        assert_eq!(curve.kind, CurveKind::Rect);
        assert_eq!(curve.bbox, Rect::new(10.0, 10.0, 50.0, 30.0));
        assert_eq!(curve.to_string(), "<LTRect 10.000,10.000,50.000,30.000>");
    }

    #[test]
    fn test_redundant_closing_line_is_dropped() {
        let p = path(vec![
            ('m', vec![(0.0, 0.0)]),
            ('l', vec![(0.0, 10.0)]),
            ('l', vec![(10.0, 10.0)]),
            ('l', vec![(10.0, 0.0)]),
            ('l', vec![(0.0, 0.0)]),
            ('h', vec![]),
        ]);
        let LTItem::Curve(curve) = &process_path(&p)[0] else {
            panic!("expected a curve");
        };
        assert_eq!(curve.kind, CurveKind::Rect);
    }

    #[test]
    fn test_lines_and_curves() {
        let p = path(vec![
            ('m', vec![(0.0, 0.0)]),
            ('l', vec![(100.0, 0.0)]),
            ('m', vec![(0.0, 0.0)]),
            ('c', vec![(10.0, 10.0), (20.0, 10.0), (30.0, 0.0)]),
            ('m', vec![(0.0, 0.0)]),
            ('l', vec![(10.0, 5.0)]),
            ('l', vec![(20.0, 0.0)]),
            ('l', vec![(10.0, -5.0)]),
            ('h', vec![]),
        ]);
        let kinds: Vec<CurveKind> = process_path(&p)
            .iter()
            .filter_map(|item| match item {
                LTItem::Curve(c) => Some(c.kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![CurveKind::Line, CurveKind::Curve, CurveKind::Curve]);
    }
}

//! Table detection
//!
//! Detectors are tried in priority order. The logical structure of a
//! tagged PDF is the most reliable source and comes first; ruling lines
//! are the fallback.
//!
//! Tables never span pages here: a structure element that continues on
//! another page gives one [`TableObject`] per page.

pub mod lattice;
pub mod structure;

pub use lattice::{Lattice, LatticeSettings, LatticeTable};
pub use structure::Structure;

use crate::content::ContentObject;
use crate::document::PdfSource;
use crate::error::Result;
use crate::geometry::{get_bound_rects, Rect};
use crate::structure::{ContentItem, Element};
use tracing::debug;

/// A table on one page
#[derive(Debug, Clone, PartialEq)]
pub struct TableObject {
    pub page_index: usize,
    pub bbox: Rect,
    /// Structure element the table comes from, if any
    pub element: Option<Element>,
}

/// Whether a page object is the target of an object reference
fn is_object(obj: &ContentObject, id: lopdf::ObjectId) -> bool {
    match obj {
        ContentObject::Image(image) => image.stream_id == Some(id),
        ContentObject::XObject(xobj) => xobj.stream_id == Some(id),
        _ => false,
    }
}

fn item_bbox(item: &ContentItem, objects: &[ContentObject]) -> Rect {
    let boxes = objects.iter().filter(|obj| match item {
        ContentItem::MarkedContent { mcid, .. } => obj.mcid() == Some(*mcid),
        ContentItem::Object { id, .. } => is_object(obj, *id),
    });
    get_bound_rects(boxes.map(ContentObject::bbox).filter(|r| !r.is_none()))
}

impl TableObject {
    /// A table known only by its box, e.g. from ruling lines
    pub fn from_bbox(page_index: usize, bbox: Rect) -> Self {
        Self {
            page_index,
            bbox,
            element: None,
        }
    }

    /// The part of `element` on one page.
    ///
    /// `objects` are the flattened content objects of that page. Returns
    /// `None` when none of the element's contents are painted there.
    ///
    /// The box comes from the first referenced whole object if there
    /// is one, then from the element's own layout box when it belongs
    /// to this page, and finally from the union of its contents.
    pub fn from_element(
        element: &Element,
        page_index: usize,
        objects: &[ContentObject],
    ) -> Option<Self> {
        let contents: Vec<ContentItem> = element
            .contents()
            .into_iter()
            .filter(|item| item.page_index() == Some(page_index))
            .collect();
        let mut explicit: Option<Rect> = None;
        let mut painted = false;
        for item in &contents {
            match item {
                ContentItem::Object { id, .. } => {
                    if let Some(obj) = objects.iter().find(|obj| is_object(obj, *id)) {
                        explicit = Some(obj.bbox());
                        painted = true;
                        break;
                    }
                }
                ContentItem::MarkedContent { mcid, .. } => {
                    if objects.iter().any(|obj| obj.mcid() == Some(*mcid)) {
                        painted = true;
                        break;
                    }
                }
            }
        }
        if !painted {
            return None;
        }
        let bbox = explicit
            .or(element.bbox.filter(|_| element.page_index == Some(page_index)))
            .unwrap_or_else(|| {
                get_bound_rects(
                    contents
                        .iter()
                        .map(|item| item_bbox(item, objects))
                        .filter(|r| !r.is_none()),
                )
            });
        Some(Self {
            page_index,
            bbox,
            element: Some(element.clone()),
        })
    }
}

/// A way of finding tables
pub trait Detector {
    fn name(&self) -> &'static str;

    /// Lower runs first
    fn priority(&self) -> i32;

    /// Tables in `source`, or `None` if this method does not apply.
    fn detect(&self, source: &PdfSource<'_>) -> Result<Option<Vec<TableObject>>>;
}

/// Built-in detectors, by priority
pub fn detectors() -> Vec<Box<dyn Detector>> {
    let mut detectors: Vec<Box<dyn Detector>> =
        vec![Box::new(Lattice::default()), Box::new(Structure)];
    detectors.sort_by_key(|d| d.priority());
    detectors
}

/// Find a built-in detector by name.
pub fn lookup(name: &str) -> Option<Box<dyn Detector>> {
    detectors().into_iter().find(|d| d.name() == name)
}

/// Tables from the first detector that applies, `None` if none does.
pub fn tables_orelse<'a>(source: impl Into<PdfSource<'a>>) -> Result<Option<Vec<TableObject>>> {
    tables_orelse_with(&detectors(), &source.into())
}

/// Like [`tables_orelse`] with an explicit set of detectors.
pub fn tables_orelse_with(
    detectors: &[Box<dyn Detector>],
    source: &PdfSource<'_>,
) -> Result<Option<Vec<TableObject>>> {
    let mut ordered: Vec<&dyn Detector> = detectors.iter().map(|d| d.as_ref()).collect();
    ordered.sort_by_key(|d| d.priority());
    for detector in ordered {
        if let Some(tables) = detector.detect(source)? {
            debug!("Detector {} found {} tables", detector.name(), tables.len());
            return Ok(Some(tables));
        }
        debug!("Detector {} does not apply", detector.name());
    }
    Ok(None)
}

/// Tables in a document, page list or page; empty if no detector applies.
pub fn tables<'a>(source: impl Into<PdfSource<'a>>) -> Result<Vec<TableObject>> {
    Ok(tables_orelse(source)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{GraphicState, MarkedContent, ObjectState, PathObject, PathSegment};
    use crate::geometry::{Matrix, Point};
    use crate::structure::Kid;
    use std::path::PathBuf;

    fn painted(page_index: usize, mcid: Option<i64>, rect: Rect) -> ContentObject {
        ContentObject::Path(PathObject {
            state: ObjectState {
                page_index,
                gstate: GraphicState::default(),
                ctm: Matrix::IDENTITY,
                mcstack: vec![MarkedContent {
                    tag: "P".to_string(),
                    mcid,
                    props: Default::default(),
                }],
            },
            segments: vec![
                PathSegment::new('m', vec![Point::new(rect.x0, rect.y0)]),
                PathSegment::new('l', vec![Point::new(rect.x1, rect.y1)]),
            ],
            stroke: true,
            fill: false,
            evenodd: false,
        })
    }

    fn table(kids: Vec<Kid>, page_index: Option<usize>, bbox: Option<Rect>) -> Element {
        Element {
            element_type: "Table".to_string(),
            role: "Table".to_string(),
            page_index,
            bbox,
            title: None,
            alt: None,
            actual_text: None,
            kids,
        }
    }

    fn mcr(page_index: usize, mcid: i64) -> Kid {
        Kid::Content(ContentItem::MarkedContent {
            page_index: Some(page_index),
            mcid,
        })
    }

    #[test]
    fn test_bbox_from_contents() {
        let objects = vec![
            painted(0, Some(1), Rect::new(10.0, 10.0, 20.0, 20.0)),
            painted(0, Some(2), Rect::new(15.0, 30.0, 40.0, 35.0)),
            painted(0, Some(3), Rect::new(0.0, 0.0, 500.0, 500.0)),
        ];
        let el = table(vec![mcr(0, 1), mcr(0, 2), mcr(1, 3)], Some(0), None);
        let found = TableObject::from_element(&el, 0, &objects).unwrap();
        assert_eq!(found.bbox, Rect::new(10.0, 10.0, 40.0, 35.0));
        assert_eq!(found.element.as_ref().map(|e| e.element_type.as_str()), Some("Table"));
    }

    #[test]
    fn test_element_bbox_only_on_its_page() {
        let layout = Rect::new(0.0, 0.0, 100.0, 100.0);
        let objects = vec![painted(1, Some(4), Rect::new(1.0, 2.0, 3.0, 4.0))];
        let el = table(vec![mcr(0, 1), mcr(1, 4)], Some(0), Some(layout));
        let on_other_page = TableObject::from_element(&el, 1, &objects).unwrap();
        assert_eq!(on_other_page.bbox, Rect::new(1.0, 2.0, 3.0, 4.0));

        let objects = vec![painted(0, Some(1), Rect::new(1.0, 2.0, 3.0, 4.0))];
        let on_own_page = TableObject::from_element(&el, 0, &objects).unwrap();
        assert_eq!(on_own_page.bbox, layout);
    }

    #[test]
    fn test_no_table_without_painted_contents() {
        let objects = vec![painted(0, Some(9), Rect::new(1.0, 2.0, 3.0, 4.0))];
        let el = table(vec![mcr(0, 1)], Some(0), None);
        assert!(TableObject::from_element(&el, 0, &objects).is_none());
    }

    struct Fixed(&'static str, i32, Option<usize>);

    impl Detector for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn priority(&self) -> i32 {
            self.1
        }

        fn detect(&self, _: &PdfSource<'_>) -> Result<Option<Vec<TableObject>>> {
            Ok(self.2.map(|n| {
                (0..n)
                    .map(|i| TableObject::from_bbox(i, Rect::new(0.0, 0.0, 1.0, 1.0)))
                    .collect()
            }))
        }
    }

    #[test]
    fn test_first_applicable_detector_wins() {
        let source = PdfSource::Path(PathBuf::from("unused.pdf"));
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(Fixed("late", 30, Some(3))),
            Box::new(Fixed("inapplicable", 0, None)),
            Box::new(Fixed("empty", 10, Some(0))),
        ];
        let found = tables_orelse_with(&detectors, &source).unwrap();
        assert_eq!(found, Some(Vec::new()));

        let none: Vec<Box<dyn Detector>> = vec![Box::new(Fixed("inapplicable", 0, None))];
        assert_eq!(tables_orelse_with(&none, &source).unwrap(), None);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("structure").map(|d| d.priority()), Some(0));
        assert_eq!(lookup("lattice").map(|d| d.priority()), Some(10));
        assert!(lookup("tatr").is_none());
        let names: Vec<&str> = detectors().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["structure", "lattice"]);
    }
}

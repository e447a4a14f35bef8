//! In-memory PDFs for integration tests
//!
//! Every test document is built with lopdf, so no binary fixtures live
//! in the repository.

#![allow(dead_code)]

use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};
use paves::Document;

pub struct PdfBuilder {
    doc: lopdf::Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    page_ids: Vec<ObjectId>,
    struct_kids: Vec<Object>,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = lopdf::Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        Self {
            doc,
            pages_id,
            font_id,
            page_ids: Vec::new(),
            struct_kids: Vec::new(),
        }
    }

    /// Add a 200x200 page with `/F1` set to Helvetica.
    pub fn page(&mut self, content: &str) -> ObjectId {
        self.page_with(content, [0, 0, 200, 200], Dictionary::new())
    }

    pub fn page_with(&mut self, content: &str, mediabox: [i64; 4], extra: Dictionary) -> ObjectId {
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(self.pages_id),
            "MediaBox" => mediabox.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => Object::Reference(self.font_id),
                },
            },
        };
        for (key, value) in extra.iter() {
            page.set(key.clone(), value.clone());
        }
        let page_id = self.doc.add_object(page);
        self.page_ids.push(page_id);
        page_id
    }

    /// Add a structure element with MCIDs on one page as its kids.
    pub fn element(&mut self, element_type: &str, page_id: ObjectId, mcids: &[i64]) -> ObjectId {
        let id = self.doc.add_object(dictionary! {
            "Type" => "StructElem",
            "S" => Object::Name(element_type.as_bytes().to_vec()),
            "Pg" => Object::Reference(page_id),
            "K" => mcids.iter().map(|&m| Object::Integer(m)).collect::<Vec<_>>(),
        });
        self.struct_kids.push(Object::Reference(id));
        id
    }

    pub fn doc_mut(&mut self) -> &mut lopdf::Document {
        &mut self.doc
    }

    pub fn build(mut self) -> Vec<u8> {
        let kids: Vec<Object> = self.page_ids.iter().map(|&id| Object::Reference(id)).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(self.pages_id),
        };
        if !self.struct_kids.is_empty() {
            let root_id = self.doc.add_object(dictionary! {
                "Type" => "StructTreeRoot",
                "K" => self.struct_kids.clone(),
            });
            catalog.set("StructTreeRoot", Object::Reference(root_id));
            catalog.set("MarkInfo", dictionary! { "Marked" => true });
        }
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", Object::Reference(catalog_id));
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .expect("in-memory PDF should serialize");
        buffer
    }

    pub fn document(self) -> Document {
        Document::from_bytes(self.build()).expect("built PDF should load")
    }
}

/// Content drawing a grid of ruling lines, in PDF coordinates
pub fn grid(xs: &[f64], ys: &[f64]) -> String {
    let (left, right) = (xs[0], xs[xs.len() - 1]);
    let (bottom, top) = (ys[0], ys[ys.len() - 1]);
    let mut content = String::from("0.5 w\n");
    for y in ys {
        content.push_str(&format!("{left} {y} m {right} {y} l S\n"));
    }
    for x in xs {
        content.push_str(&format!("{x} {bottom} m {x} {top} l S\n"));
    }
    content
}

/// Content showing `text` at `(x, y)` in 10 point Helvetica
pub fn text(x: f64, y: f64, text: &str) -> String {
    format!("BT /F1 10 Tf {x} {y} Td ({text}) Tj ET\n")
}

/// Like [`text`] inside a marked content section
pub fn tagged_text(tag: &str, mcid: i64, x: f64, y: f64, s: &str) -> String {
    format!("/{tag} <</MCID {mcid}>> BDC\n{}EMC\n", text(x, y, s))
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

pub fn assert_rect_close(actual: paves::Rect, expected: [f64; 4]) {
    let got = [actual.x0, actual.y0, actual.x1, actual.y1];
    for (a, e) in got.iter().zip(expected.iter()) {
        assert!((a - e).abs() < 1e-3, "expected {expected:?}, got {got:?}");
    }
}

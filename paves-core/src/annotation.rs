//! Page annotations

use crate::geometry::{Matrix, Rect};
use crate::pdfobj;
use lopdf::{Dictionary, Document};

/// An annotation from a page's `/Annots` array
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub subtype: String,
    /// Rectangle in default user space
    pub rect: Rect,
    pub contents: Option<String>,
    /// Annotation name (`/NM`)
    pub name: Option<String>,
    pub page_index: usize,
    ctm: Matrix,
}

impl Annotation {
    /// Read an annotation dictionary; `None` if it has no usable `/Rect`.
    pub(crate) fn from_dict(
        doc: &Document,
        dict: &Dictionary,
        page_index: usize,
        ctm: Matrix,
    ) -> Option<Self> {
        let rect = pdfobj::get_rect(doc, dict, b"Rect")?;
        Some(Self {
            subtype: pdfobj::get_name(doc, dict, b"Subtype").unwrap_or_default(),
            rect,
            contents: pdfobj::get_text(doc, dict, b"Contents"),
            name: pdfobj::get_text(doc, dict, b"NM"),
            page_index,
            ctm,
        })
    }

    /// The rectangle in the document's coordinate space
    pub fn bbox(&self) -> Rect {
        self.rect.transform(&self.ctm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object};

    #[test]
    fn test_annotation_bbox_uses_page_ctm() {
        let doc = Document::with_version("1.7");
        let dict = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![Object::Integer(10), Object::Integer(700), Object::Integer(110), Object::Integer(720)],
            "Contents" => Object::string_literal("Go"),
        };
        let ctm = Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, 792.0);
        let annot = Annotation::from_dict(&doc, &dict, 3, ctm).unwrap();
        assert_eq!(annot.subtype, "Link");
        assert_eq!(annot.contents.as_deref(), Some("Go"));
        assert_eq!(annot.page_index, 3);
        assert_eq!(annot.bbox(), Rect::new(10.0, 72.0, 110.0, 92.0));
    }

    #[test]
    fn test_annotation_without_rect_is_skipped() {
        let doc = Document::with_version("1.7");
        let dict = dictionary! { "Subtype" => "Text" };
        assert!(Annotation::from_dict(&doc, &dict, 0, Matrix::IDENTITY).is_none());
    }
}

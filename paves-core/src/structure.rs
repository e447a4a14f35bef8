//! Logical structure tree
//!
//! Tagged PDFs describe their content as a tree of structure elements
//! (`Table`, `P`, `Figure`...) whose leaves point into page content,
//! either as marked content sections `(page, MCID)` or as whole
//! objects. Custom element types are mapped to standard ones through
//! the `/RoleMap`.

use crate::document::Document;
use crate::error::Result;
use crate::geometry::{Matrix, Rect};
use crate::pdfobj;
use lopdf::{Dictionary, Object, ObjectId};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

const MAX_STRUCTURE_DEPTH: usize = 256;
const MAX_ROLE_CHAIN: usize = 16;

/// A leaf of the structure tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentItem {
    /// Marked content section with an MCID
    MarkedContent { page_index: Option<usize>, mcid: i64 },
    /// A whole object (image or form XObject, annotation)
    Object {
        page_index: Option<usize>,
        id: ObjectId,
    },
}

impl ContentItem {
    pub fn page_index(&self) -> Option<usize> {
        match self {
            ContentItem::MarkedContent { page_index, .. } => *page_index,
            ContentItem::Object { page_index, .. } => *page_index,
        }
    }
}

/// A child of a structure element
#[derive(Debug, Clone, PartialEq)]
pub enum Kid {
    Element(Element),
    Content(ContentItem),
}

/// A structure element
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Structure type as written (`/S`)
    pub element_type: String,
    /// Standard type after role mapping
    pub role: String,
    pub page_index: Option<usize>,
    /// Layout bounding box in the document's coordinate space
    pub bbox: Option<Rect>,
    pub title: Option<String>,
    pub alt: Option<String>,
    pub actual_text: Option<String>,
    pub kids: Vec<Kid>,
}

impl Element {
    /// Whether this element has the given type, directly or by role
    pub fn is_type(&self, element_type: &str) -> bool {
        self.element_type == element_type || self.role == element_type
    }

    /// Child elements
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.kids.iter().filter_map(|kid| match kid {
            Kid::Element(el) => Some(el),
            Kid::Content(_) => None,
        })
    }

    /// Every content item of this subtree, in order
    pub fn contents(&self) -> Vec<ContentItem> {
        let mut items = Vec::new();
        self.collect_contents(&mut items);
        items
    }

    fn collect_contents(&self, items: &mut Vec<ContentItem>) {
        for kid in &self.kids {
            match kid {
                Kid::Element(el) => el.collect_contents(items),
                Kid::Content(item) => items.push(*item),
            }
        }
    }

    /// Pages touched by this element's contents, in order of appearance
    pub fn pages(&self) -> Vec<usize> {
        let mut pages: Vec<usize> = Vec::new();
        for page in self.contents().iter().filter_map(ContentItem::page_index) {
            if !pages.contains(&page) {
                pages.push(page);
            }
        }
        if pages.is_empty() {
            pages.extend(self.page_index);
        }
        pages
    }

    /// Descendants of the given type, depth first
    pub fn find_all(&self, element_type: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        for child in self.children() {
            collect_matching(child, element_type, &mut found);
        }
        found
    }
}

fn collect_matching<'a>(el: &'a Element, element_type: &str, found: &mut Vec<&'a Element>) {
    if el.is_type(element_type) {
        found.push(el);
    }
    for child in el.children() {
        collect_matching(child, element_type, found);
    }
}

/// The structure tree of a document
#[derive(Debug, Clone, PartialEq)]
pub struct StructTree {
    pub children: Vec<Element>,
    pub role_map: HashMap<String, String>,
}

impl StructTree {
    /// All elements of the given type in document order
    pub fn find_all(&self, element_type: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        for el in &self.children {
            collect_matching(el, element_type, &mut found);
        }
        found
    }

    /// Number of elements in the tree
    pub fn len(&self) -> usize {
        fn count(el: &Element) -> usize {
            1 + el.children().map(count).sum::<usize>()
        }
        self.children.iter().map(count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Document {
    /// The logical structure tree, or `None` for untagged documents
    pub fn structure(&self) -> Result<Option<StructTree>> {
        let doc = self.inner();
        let Some(root) = self
            .catalog()
            .and_then(|catalog| pdfobj::get_dict(doc, catalog, b"StructTreeRoot"))
        else {
            return Ok(None);
        };
        let role_map = read_role_map(doc, root);
        let mut loader = TreeLoader {
            doc: self,
            role_map: &role_map,
            visited: HashSet::new(),
            page_ctms: HashMap::new(),
        };
        let mut children = Vec::new();
        if let Ok(k) = root.get(b"K") {
            for kid in loader.kids(k, None, 0) {
                match kid {
                    Kid::Element(el) => children.push(el),
                    Kid::Content(item) => debug!("Ignoring content item at structure root: {item:?}"),
                }
            }
        }
        debug!("Loaded structure tree with {} top-level elements", children.len());
        Ok(Some(StructTree { children, role_map }))
    }
}

fn read_role_map(doc: &lopdf::Document, root: &Dictionary) -> HashMap<String, String> {
    let Some(map) = pdfobj::get_dict(doc, root, b"RoleMap") else {
        return HashMap::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let target = pdfobj::resolve(doc, value).and_then(pdfobj::as_name)?;
            Some((String::from_utf8_lossy(key).into_owned(), target))
        })
        .collect()
}

fn map_role(role_map: &HashMap<String, String>, element_type: &str) -> String {
    let mut role = element_type;
    for _ in 0..MAX_ROLE_CHAIN {
        match role_map.get(role) {
            Some(next) if next != role => role = next,
            _ => break,
        }
    }
    role.to_string()
}

struct TreeLoader<'a> {
    doc: &'a Document,
    role_map: &'a HashMap<String, String>,
    visited: HashSet<ObjectId>,
    page_ctms: HashMap<usize, Matrix>,
}

impl<'a> TreeLoader<'a> {
    fn page_of(&self, dict: &Dictionary) -> Option<usize> {
        pdfobj::get_reference(dict, b"Pg").and_then(|id| self.doc.page_index_of(id))
    }

    /// Resolve a kid, remembering references to avoid cycles.
    fn enter(&mut self, obj: &'a Object) -> Option<&'a Object> {
        if let Object::Reference(id) = obj {
            if !self.visited.insert(*id) {
                warn!("Cycle in structure tree at object {id:?}");
                return None;
            }
        }
        pdfobj::resolve(self.doc.inner(), obj)
    }

    fn kids(&mut self, obj: &'a Object, page_index: Option<usize>, depth: usize) -> Vec<Kid> {
        if depth > MAX_STRUCTURE_DEPTH {
            warn!("Structure tree deeper than {MAX_STRUCTURE_DEPTH}, truncating");
            return Vec::new();
        }
        let Some(obj) = self.enter(obj) else {
            return Vec::new();
        };
        match obj {
            Object::Array(items) => items
                .iter()
                .flat_map(|item| self.kid(item, page_index, depth))
                .collect(),
            _ => self.kid(obj, page_index, depth).into_iter().collect(),
        }
    }

    fn kid(&mut self, obj: &'a Object, page_index: Option<usize>, depth: usize) -> Option<Kid> {
        let doc = self.doc.inner();
        let resolved = self.enter(obj)?;
        match resolved {
            Object::Integer(mcid) => Some(Kid::Content(ContentItem::MarkedContent {
                page_index,
                mcid: *mcid,
            })),
            Object::Dictionary(dict) => {
                let page_index = self.page_of(dict).or(page_index);
                match pdfobj::get_name(doc, dict, b"Type").as_deref() {
                    Some("MCR") => {
                        let mcid = pdfobj::get_number(doc, dict, b"MCID")? as i64;
                        Some(Kid::Content(ContentItem::MarkedContent { page_index, mcid }))
                    }
                    Some("OBJR") => {
                        let id = pdfobj::get_reference(dict, b"Obj")?;
                        Some(Kid::Content(ContentItem::Object { page_index, id }))
                    }
                    _ if dict.has(b"S") => {
                        Some(Kid::Element(self.element(dict, page_index, depth + 1)))
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn element(&mut self, dict: &'a Dictionary, page_index: Option<usize>, depth: usize) -> Element {
        let doc = self.doc.inner();
        let element_type = pdfobj::get_name(doc, dict, b"S").unwrap_or_default();
        let kids = match dict.get(b"K").ok() {
            Some(k) => self.kids(k, page_index, depth),
            None => Vec::new(),
        };
        let bbox = page_index.and_then(|page| {
            let layout = layout_bbox(doc, dict)?;
            Some(layout.transform(&self.page_ctm(page)?))
        });
        Element {
            role: map_role(self.role_map, &element_type),
            element_type,
            page_index,
            bbox,
            title: pdfobj::get_text(doc, dict, b"T"),
            alt: pdfobj::get_text(doc, dict, b"Alt"),
            actual_text: pdfobj::get_text(doc, dict, b"ActualText"),
            kids,
        }
    }

    fn page_ctm(&mut self, page_index: usize) -> Option<Matrix> {
        if let Some(ctm) = self.page_ctms.get(&page_index) {
            return Some(*ctm);
        }
        let ctm = self.doc.page(page_index).ok()?.ctm();
        self.page_ctms.insert(page_index, ctm);
        Some(ctm)
    }
}

/// `/BBox` of the Layout attribute object(s), in user space
fn layout_bbox(doc: &lopdf::Document, dict: &Dictionary) -> Option<Rect> {
    let attrs = pdfobj::get(doc, dict, b"A")?;
    let candidates: Vec<&Object> = match attrs {
        Object::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    candidates
        .into_iter()
        .filter_map(|obj| pdfobj::resolve(doc, obj).and_then(pdfobj::as_dict))
        .filter(|attr| pdfobj::get_name(doc, attr, b"O").as_deref() == Some("Layout"))
        .find_map(|attr| pdfobj::get_rect(doc, attr, b"BBox"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(element_type: &str, role: &str, kids: Vec<Kid>) -> Element {
        Element {
            element_type: element_type.to_string(),
            role: role.to_string(),
            page_index: Some(0),
            bbox: None,
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
    fn test_find_all_in_document_order() {
        let table1 = element("Table", "Table", vec![mcr(0, 1)]);
        let table2 = element("Tabelle", "Table", vec![mcr(1, 0)]);
        let section = element(
            "Sect",
            "Sect",
            vec![Kid::Element(table1), Kid::Element(element("P", "P", vec![mcr(0, 2)]))],
        );
        let tree = StructTree {
            children: vec![section, table2],
            role_map: HashMap::from([("Tabelle".to_string(), "Table".to_string())]),
        };
        let tables = tree.find_all("Table");
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].element_type, "Table");
        assert_eq!(tables[1].element_type, "Tabelle");
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_contents_and_pages() {
        let row = element("TR", "TR", vec![mcr(2, 5), mcr(3, 0)]);
        let table = element("Table", "Table", vec![mcr(2, 4), Kid::Element(row)]);
        let contents = table.contents();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1], ContentItem::MarkedContent { page_index: Some(2), mcid: 5 });
        assert_eq!(table.pages(), vec![2, 3]);
    }

    #[test]
    fn test_role_map_chain() {
        let role_map = HashMap::from([
            ("Foo".to_string(), "Bar".to_string()),
            ("Bar".to_string(), "Table".to_string()),
            ("Loop".to_string(), "Loop".to_string()),
        ]);
        assert_eq!(map_role(&role_map, "Foo"), "Table");
        assert_eq!(map_role(&role_map, "Loop"), "Loop");
        assert_eq!(map_role(&role_map, "P"), "P");
    }
}

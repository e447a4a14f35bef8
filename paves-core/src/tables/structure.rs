//! Tables from the logical structure tree

use super::{Detector, TableObject};
use crate::content::ContentObject;
use crate::document::{Document, PdfSource};
use crate::error::Result;
use crate::structure::Element;
use std::collections::HashMap;
use tracing::debug;

/// Detector using `Table` structure elements of tagged PDFs
#[derive(Debug, Clone, Copy, Default)]
pub struct Structure;

/// Flattened page objects, interpreted once per page
struct PageCache<'d> {
    doc: &'d Document,
    pages: HashMap<usize, Vec<ContentObject>>,
}

impl<'d> PageCache<'d> {
    fn new(doc: &'d Document) -> Self {
        Self {
            doc,
            pages: HashMap::new(),
        }
    }

    fn objects(&mut self, index: usize) -> Result<&[ContentObject]> {
        if !self.pages.contains_key(&index) {
            let objects = self.doc.page(index)?.flatten()?;
            self.pages.insert(index, objects);
        }
        Ok(self.pages.get(&index).map(Vec::as_slice).unwrap_or(&[]))
    }
}

fn on_page(element: &Element, index: usize) -> bool {
    element
        .contents()
        .iter()
        .any(|item| item.page_index() == Some(index))
}

impl Detector for Structure {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn detect(&self, source: &PdfSource<'_>) -> Result<Option<Vec<TableObject>>> {
        let whole_document = matches!(source, PdfSource::Path(_) | PdfSource::Document(_));
        let single_page = matches!(source, PdfSource::Page(_));
        source.with_document(|doc, indices| {
            let Some(tree) = doc.structure()? else {
                debug!("No logical structure");
                return Ok(None);
            };
            let elements = tree.find_all("Table");
            let mut cache = PageCache::new(doc);
            let mut tables = Vec::new();
            if whole_document {
                for element in elements {
                    for index in element.pages() {
                        let objects = cache.objects(index)?;
                        tables.extend(TableObject::from_element(element, index, objects));
                    }
                }
                return Ok(Some(tables));
            }
            for &index in indices {
                if single_page && doc.page(index)?.marked_content_ids()?.is_empty() {
                    debug!("Page {} has no marked content", index);
                    return Ok(None);
                }
                for element in elements.iter().filter(|el| on_page(el, index)) {
                    let objects = cache.objects(index)?;
                    tables.extend(TableObject::from_element(element, index, objects));
                }
            }
            Ok(Some(tables))
        })
    }
}

//! Documents and pages
//!
//! A [`Document`] keeps the original bytes next to the parsed object
//! graph, so external renderers can receive exactly what was loaded.
//! Coordinates of everything extracted from a page are expressed in the
//! document's [`Space`].

use crate::annotation::Annotation;
use crate::content::{ContentObject, ImageObject, Interpreter, PathObject, TextObject, XObjectObject};
use crate::error::{PavesError, Result};
use crate::geometry::{Matrix, Rect};
use crate::pdfobj;
use lopdf::{Dictionary, Object, ObjectId};
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const MAX_INHERITANCE_DEPTH: usize = 32;

/// US Letter, used when a page has no usable MediaBox
const DEFAULT_MEDIABOX: Rect = Rect {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// Coordinate space for extracted objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Space {
    /// Origin at the top-left of the rotated page, y grows downward
    #[default]
    Screen,
    /// Origin at the bottom-left of the rotated page, y grows upward
    Page,
    /// Untransformed PDF user space
    Default,
}

impl FromStr for Space {
    type Err = PavesError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "screen" => Ok(Space::Screen),
            "page" => Ok(Space::Page),
            "default" => Ok(Space::Default),
            other => Err(PavesError::InvalidArgument(format!(
                "Unknown space {other:?}, expected screen, page or default"
            ))),
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Space::Screen => "screen",
            Space::Page => "page",
            Space::Default => "default",
        };
        f.write_str(name)
    }
}

/// A loaded PDF document
pub struct Document {
    inner: lopdf::Document,
    buffer: Vec<u8>,
    path: Option<PathBuf>,
    space: Space,
    page_ids: Vec<ObjectId>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("pages", &self.page_ids.len())
            .field("space", &self.space)
            .finish()
    }
}

impl Document {
    /// Open a PDF file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let buffer = std::fs::read(path)?;
        let mut doc = Self::from_bytes(buffer)?;
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    /// Load a PDF from memory
    pub fn from_bytes(buffer: Vec<u8>) -> Result<Self> {
        let inner = lopdf::Document::load_mem(&buffer)?;
        let page_ids: Vec<ObjectId> = inner.get_pages().into_values().collect();
        debug!("Loaded document with {} pages", page_ids.len());
        Ok(Self {
            inner,
            buffer,
            path: None,
            space: Space::default(),
            page_ids,
        })
    }

    /// Use another coordinate space for extracted objects
    pub fn with_space(mut self, space: Space) -> Self {
        self.space = space;
        self
    }

    pub fn space(&self) -> Space {
        self.space
    }

    /// The bytes the document was loaded from
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The underlying object graph
    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn page(&self, index: usize) -> Result<Page<'_>> {
        let id = *self
            .page_ids
            .get(index)
            .ok_or(PavesError::InvalidPage(index))?;
        Ok(Page {
            doc: self,
            index,
            id,
        })
    }

    /// All pages, in order
    pub fn pages(&self) -> PageList<'_> {
        PageList {
            doc: self,
            indices: (0..self.page_ids.len()).collect(),
        }
    }

    /// Index of the page with the given object id
    pub fn page_index_of(&self, id: ObjectId) -> Option<usize> {
        self.page_ids.iter().position(|page_id| *page_id == id)
    }

    /// The document catalog
    pub fn catalog(&self) -> Option<&Dictionary> {
        pdfobj::get_dict(&self.inner, &self.inner.trailer, b"Root")
    }
}

/// A page of a document
#[derive(Clone, Copy)]
pub struct Page<'a> {
    doc: &'a Document,
    index: usize,
    id: ObjectId,
}

impl fmt::Debug for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("index", &self.index)
            .field("id", &self.id)
            .finish()
    }
}

impl<'a> Page<'a> {
    /// Zero-based page index
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn doc(&self) -> &'a Document {
        self.doc
    }

    pub fn space(&self) -> Space {
        self.doc.space
    }

    fn dict(&self) -> Option<&'a Dictionary> {
        self.doc.inner.get_object(self.id).ok().and_then(pdfobj::as_dict)
    }

    /// Look up an attribute, following the page tree for inheritable ones
    fn inherited(&self, key: &[u8]) -> Option<&'a Object> {
        let doc = &self.doc.inner;
        let mut dict = self.dict()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Some(value) = pdfobj::get(doc, dict, key) {
                return Some(value);
            }
            dict = pdfobj::get_dict(doc, dict, b"Parent")?;
        }
        None
    }

    pub fn mediabox(&self) -> Rect {
        self.inherited(b"MediaBox")
            .and_then(|obj| pdfobj::as_rect(&self.doc.inner, obj))
            .unwrap_or(DEFAULT_MEDIABOX)
    }

    pub fn cropbox(&self) -> Rect {
        self.inherited(b"CropBox")
            .and_then(|obj| pdfobj::as_rect(&self.doc.inner, obj))
            .unwrap_or_else(|| self.mediabox())
    }

    /// Page rotation in degrees: 0, 90, 180 or 270
    pub fn rotate(&self) -> i64 {
        let rotate = self
            .inherited(b"Rotate")
            .and_then(pdfobj::as_number)
            .unwrap_or(0.0) as i64;
        (rotate.rem_euclid(360) / 90) * 90
    }

    /// Width in points, after rotation
    pub fn width(&self) -> f64 {
        let mediabox = self.mediabox();
        match self.rotate() {
            90 | 270 => mediabox.height(),
            _ => mediabox.width(),
        }
    }

    /// Height in points, after rotation
    pub fn height(&self) -> f64 {
        let mediabox = self.mediabox();
        match self.rotate() {
            90 | 270 => mediabox.width(),
            _ => mediabox.height(),
        }
    }

    /// Transformation from user space to the document's space
    pub fn ctm(&self) -> Matrix {
        let Rect { x0, y0, x1, y1 } = self.mediabox();
        let page_ctm = match self.rotate() {
            90 => Matrix::new(0.0, -1.0, 1.0, 0.0, -y0, x1),
            180 => Matrix::new(-1.0, 0.0, 0.0, -1.0, x1, y1),
            270 => Matrix::new(0.0, 1.0, -1.0, 0.0, y1, -x0),
            _ => Matrix::new(1.0, 0.0, 0.0, 1.0, -x0, -y0),
        };
        match self.space() {
            Space::Page => page_ctm,
            Space::Screen => {
                page_ctm.multiply(&Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, self.height()))
            }
            Space::Default => Matrix::IDENTITY,
        }
    }

    /// Resources dictionary, inherited if needed
    pub fn resources(&self) -> Option<&'a Dictionary> {
        self.inherited(b"Resources").and_then(pdfobj::as_dict)
    }

    /// Concatenated content streams
    pub fn contents(&self) -> Vec<u8> {
        let doc = &self.doc.inner;
        let Some(dict) = self.dict() else {
            return Vec::new();
        };
        let streams: Vec<&Object> = match pdfobj::get(doc, dict, b"Contents") {
            Some(Object::Array(items)) => items
                .iter()
                .filter_map(|item| pdfobj::resolve(doc, item))
                .collect(),
            Some(obj) => vec![obj],
            None => Vec::new(),
        };
        let mut data = Vec::new();
        for obj in streams {
            if let Object::Stream(stream) = obj {
                data.extend(pdfobj::stream_data(stream));
                data.push(b'\n');
            }
        }
        data
    }

    /// Interpret the page and return its top-level objects.
    pub fn objects(&self) -> Result<Vec<ContentObject>> {
        let mut interpreter = Interpreter::new(
            &self.doc.inner,
            self.index,
            self.resources(),
            self.ctm(),
            self.space() == Space::Screen,
        );
        Ok(interpreter.run(&self.contents()))
    }

    /// All objects including those nested in form XObjects
    pub fn flatten(&self) -> Result<Vec<ContentObject>> {
        Ok(self
            .objects()?
            .iter()
            .flat_map(ContentObject::flatten)
            .cloned()
            .collect())
    }

    pub fn texts(&self) -> Result<Vec<TextObject>> {
        Ok(self
            .flatten()?
            .into_iter()
            .filter_map(|obj| match obj {
                ContentObject::Text(text) => Some(text),
                _ => None,
            })
            .collect())
    }

    pub fn paths(&self) -> Result<Vec<PathObject>> {
        Ok(self
            .flatten()?
            .into_iter()
            .filter_map(|obj| match obj {
                ContentObject::Path(path) => Some(path),
                _ => None,
            })
            .collect())
    }

    pub fn images(&self) -> Result<Vec<ImageObject>> {
        Ok(self
            .flatten()?
            .into_iter()
            .filter_map(|obj| match obj {
                ContentObject::Image(image) => Some(image),
                _ => None,
            })
            .collect())
    }

    /// Form XObjects painted directly by the page
    pub fn xobjects(&self) -> Result<Vec<XObjectObject>> {
        Ok(self
            .objects()?
            .into_iter()
            .filter_map(|obj| match obj {
                ContentObject::XObject(xobj) => Some(xobj),
                _ => None,
            })
            .collect())
    }

    pub fn annotations(&self) -> Result<Vec<Annotation>> {
        let doc = &self.doc.inner;
        let Some(dict) = self.dict() else {
            return Ok(Vec::new());
        };
        let Some(annots) = pdfobj::get_array(doc, dict, b"Annots") else {
            return Ok(Vec::new());
        };
        let ctm = self.ctm();
        Ok(annots
            .iter()
            .filter_map(|obj| pdfobj::resolve(doc, obj).and_then(pdfobj::as_dict))
            .filter_map(|annot| Annotation::from_dict(doc, annot, self.index, ctm))
            .collect())
    }

    /// Sorted marked content ids used on the page
    pub fn marked_content_ids(&self) -> Result<Vec<i64>> {
        let mut ids: Vec<i64> = self
            .flatten()?
            .iter()
            .flat_map(|obj| obj.state().mcstack.iter().filter_map(|mc| mc.mcid))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}

/// An ordered selection of pages
#[derive(Clone)]
pub struct PageList<'a> {
    doc: &'a Document,
    indices: Vec<usize>,
}

impl fmt::Debug for PageList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.indices).finish()
    }
}

impl<'a> PageList<'a> {
    pub fn doc(&self) -> &'a Document {
        self.doc
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Page indices in the document, in list order
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The `position`th page of the list
    pub fn get(&self, position: usize) -> Option<Page<'a>> {
        let index = *self.indices.get(position)?;
        self.doc.page(index).ok()
    }

    /// A sub-list by positions in this list
    pub fn select(&self, positions: impl IntoIterator<Item = usize>) -> Result<PageList<'a>> {
        let indices = positions
            .into_iter()
            .map(|pos| {
                self.indices
                    .get(pos)
                    .copied()
                    .ok_or(PavesError::InvalidPage(pos))
            })
            .collect::<Result<Vec<usize>>>()?;
        Ok(PageList {
            doc: self.doc,
            indices,
        })
    }

    /// A contiguous sub-list by positions in this list
    pub fn range(&self, range: Range<usize>) -> Result<PageList<'a>> {
        if range.end > self.indices.len() || range.start > range.end {
            return Err(PavesError::InvalidPage(range.end));
        }
        Ok(PageList {
            doc: self.doc,
            indices: self.indices[range].to_vec(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Page<'a>> + '_ {
        self.indices
            .iter()
            .filter_map(move |&index| self.doc.page(index).ok())
    }
}

impl<'a> IntoIterator for &PageList<'a> {
    type Item = Page<'a>;
    type IntoIter = std::vec::IntoIter<Page<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter().collect::<Vec<_>>().into_iter()
    }
}

/// Anything high-level operations accept as input
#[derive(Debug, Clone)]
pub enum PdfSource<'a> {
    Path(PathBuf),
    Document(&'a Document),
    Page(Page<'a>),
    Pages(PageList<'a>),
}

impl From<PathBuf> for PdfSource<'_> {
    fn from(path: PathBuf) -> Self {
        PdfSource::Path(path)
    }
}

impl From<&Path> for PdfSource<'_> {
    fn from(path: &Path) -> Self {
        PdfSource::Path(path.to_path_buf())
    }
}

impl<'a> From<&'a Document> for PdfSource<'a> {
    fn from(doc: &'a Document) -> Self {
        PdfSource::Document(doc)
    }
}

impl<'a> From<Page<'a>> for PdfSource<'a> {
    fn from(page: Page<'a>) -> Self {
        PdfSource::Page(page)
    }
}

impl<'a> From<PageList<'a>> for PdfSource<'a> {
    fn from(pages: PageList<'a>) -> Self {
        PdfSource::Pages(pages)
    }
}

impl PdfSource<'_> {
    /// Run `f` with the document and the selected page indices, opening
    /// the file first if the source is a path.
    pub fn with_document<T>(&self, f: impl FnOnce(&Document, &[usize]) -> Result<T>) -> Result<T> {
        match self {
            PdfSource::Path(path) => {
                let doc = Document::open(path)?;
                let indices: Vec<usize> = (0..doc.page_count()).collect();
                f(&doc, &indices)
            }
            PdfSource::Document(doc) => {
                let indices: Vec<usize> = (0..doc.page_count()).collect();
                f(doc, &indices)
            }
            PdfSource::Page(page) => f(page.doc, &[page.index]),
            PdfSource::Pages(pages) => f(pages.doc, &pages.indices),
        }
    }

    /// Run `f` on every selected page, in order.
    pub fn with_pages<T>(&self, mut f: impl FnMut(Page<'_>) -> Result<T>) -> Result<Vec<T>> {
        self.with_document(|doc, indices| {
            indices
                .iter()
                .map(|&index| doc.page(index).and_then(&mut f))
                .collect()
        })
    }
}

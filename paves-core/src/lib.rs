//! # paves
//!
//! PDF analysis and visualization: interpret page content into objects
//! with positions, reconstruct words and pdfminer-style layouts, find
//! tables, and draw what was found on page images.
//!
//! ## Features
//!
//! - **Content objects**: text (down to glyphs), paths, images and form
//!   XObjects with their graphics state and marked content
//! - **Coordinate spaces**: screen (origin top left), page or default
//!   user space
//! - **Logical structure**: the structure tree of tagged PDFs
//! - **Words**: heuristic word reconstruction from glyph positions
//! - **Layout**: pdfminer-compatible `LTPage` trees and layout analysis
//! - **Tables**: from logical structure or ruling lines
//! - **Images**: page rendering through Poppler or MuPDF, boxes and
//!   highlights on top
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paves::{Document, Result};
//!
//! # fn main() -> Result<()> {
//! let doc = Document::open("document.pdf")?;
//! for page in doc.pages().iter() {
//!     for word in paves::text::words(page)? {
//!         println!("{} {}", word.bbox(), word.text());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Layout analysis
//!
//! ```rust,no_run
//! use paves::miner::{self, LAParams};
//! use paves::{Document, Result, Space};
//!
//! # fn main() -> Result<()> {
//! // pdfminer uses PDF coordinates
//! let doc = Document::open("document.pdf")?.with_space(Space::Page);
//! for ltpage in miner::extract(&doc, Some(&LAParams::default()))? {
//!     for textbox in ltpage.textboxes() {
//!         print!("{}", textbox.text());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Tables
//!
//! ```rust,no_run
//! use paves::image::{draw_boxes, BoxOptions};
//! use paves::{tables, Document, Result};
//!
//! # fn main() -> Result<()> {
//! let doc = Document::open("tagged.pdf")?;
//! let found = tables::tables(doc.page(0)?)?;
//! if let Some(image) = draw_boxes(&doc, &found, &BoxOptions::default())? {
//!     image.save("tables.png")?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`document`] - documents, pages, page lists and coordinate spaces
//! - [`content`] - content stream interpretation and content objects
//! - [`structure`] - logical structure tree
//! - [`text`] - words
//! - [`miner`] - pdfminer-compatible layout
//! - [`bears`] - flat per-glyph records
//! - [`tables`] - table detection
//! - [`image`] - rendering and drawing

pub mod annotation;
pub mod bears;
pub mod content;
pub mod document;
pub mod error;
pub mod font;
pub mod geometry;
pub mod image;
pub mod miner;
pub mod pdfobj;
pub mod structure;
pub mod tables;
pub mod text;

pub use annotation::Annotation;
pub use content::{ContentObject, GlyphObject, ImageObject, PathObject, TextObject, XObjectObject};
pub use document::{Document, Page, PageList, PdfSource, Space};
pub use error::{PavesError, Result};
pub use geometry::{Matrix, Point, Rect};
pub use structure::{Element, StructTree};
pub use tables::TableObject;
pub use text::WordObject;

/// Current version of paves
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

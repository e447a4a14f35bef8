//! Flat per-glyph records
//!
//! One serializable record per glyph, suitable for JSON lines output or
//! loading into a dataframe.

use crate::content::GlyphObject;
use crate::document::{Page, PdfSource};
use crate::error::Result;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlyphRecord {
    pub page_index: usize,
    pub object_type: &'static str,
    pub text: Option<String>,
    pub cid: u32,
    pub fontname: String,
    pub size: f64,
    pub adv: f64,
    pub upright: bool,
    pub vertical: bool,
    pub render_mode: i64,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub mcid: Option<i64>,
    pub tag: Option<String>,
}

impl From<&GlyphObject> for GlyphRecord {
    fn from(glyph: &GlyphObject) -> Self {
        Self {
            page_index: glyph.page_index,
            object_type: "char",
            text: glyph.text.clone(),
            cid: glyph.cid,
            fontname: glyph.fontname.clone(),
            size: glyph.size,
            adv: glyph.adv,
            upright: glyph.upright,
            vertical: glyph.vertical,
            render_mode: glyph.render_mode,
            x0: glyph.bbox.x0,
            y0: glyph.bbox.y0,
            x1: glyph.bbox.x1,
            y1: glyph.bbox.y1,
            mcid: glyph.mcid,
            tag: glyph.tag.clone(),
        }
    }
}

/// Records for every glyph of a page, in content order
pub fn extract_page(page: &Page<'_>) -> Result<Vec<GlyphRecord>> {
    Ok(page
        .texts()?
        .iter()
        .flat_map(|text| text.glyphs.iter().map(GlyphRecord::from))
        .collect())
}

/// Records for every glyph of a document, page list or page
pub fn extract<'a>(source: impl Into<PdfSource<'a>>) -> Result<Vec<GlyphRecord>> {
    let pages = source.into().with_pages(|page| extract_page(&page))?;
    Ok(pages.into_iter().flatten().collect())
}

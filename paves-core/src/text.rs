//! Heuristic text reconstruction
//!
//! Words are whitespace-separated runs of glyphs. Breaks are found by
//! comparing each glyph's origin with where the previous glyph left
//! the pen, which works across text objects and show operators.

use crate::content::{GlyphObject, TextObject};
use crate::document::{PdfSource, Space};
use crate::error::Result;
use crate::geometry::{get_bound_rects, Point, Rect};

/// Gap along the writing direction that starts a new word
const WORD_GAP: f64 = 0.5;
/// Offset across lines beyond which a new line is assumed
const MAX_LINE_OFFSET: f64 = 100.0;

/// All text objects of a document, page list or page, in order
pub fn text_objects<'a>(source: impl Into<PdfSource<'a>>) -> Result<Vec<TextObject>> {
    let pages = source.into().with_pages(|page| page.texts())?;
    Ok(pages.into_iter().flatten().collect())
}

/// A run of glyphs without whitespace
#[derive(Debug, Clone, PartialEq)]
pub struct WordObject {
    pub page_index: usize,
    glyphs: Vec<GlyphObject>,
    next_origin: Point,
}

impl WordObject {
    pub fn text(&self) -> String {
        self.glyphs
            .iter()
            .filter_map(|g| g.text.as_deref())
            .collect()
    }

    pub fn glyphs(&self) -> &[GlyphObject] {
        &self.glyphs
    }

    /// Origin of the first glyph
    pub fn origin(&self) -> Point {
        self.glyphs
            .first()
            .map(|g| g.origin)
            .unwrap_or(self.next_origin)
    }

    /// Vector from the origin to where the next glyph would go
    pub fn displacement(&self) -> Point {
        let origin = self.origin();
        Point::new(self.next_origin.x - origin.x, self.next_origin.y - origin.y)
    }

    pub fn bbox(&self) -> Rect {
        get_bound_rects(self.glyphs.iter().map(|g| g.bbox))
    }

    pub fn mcid(&self) -> Option<i64> {
        self.glyphs.first().and_then(|g| g.mcid)
    }
}

/// A space, or a jump forward along the writing direction
pub fn word_break(glyph: &GlyphObject, origin: Point) -> bool {
    if glyph.is_space() {
        return true;
    }
    let (off, poff) = if glyph.vertical {
        (glyph.origin.y, origin.y)
    } else {
        (glyph.origin.x, origin.x)
    };
    off - poff > WORD_GAP
}

/// Movement backward across lines, or too far forward
pub fn line_break(glyph: &GlyphObject, origin: Point, space: Space) -> bool {
    let line_offset = if glyph.vertical {
        glyph.origin.x - origin.x
    } else {
        let dy = glyph.origin.y - origin.y;
        if space == Space::Screen {
            -dy
        } else {
            dy
        }
    };
    !(0.0..=MAX_LINE_OFFSET).contains(&line_offset)
}

/// Group glyphs of text objects into words.
pub fn words_from<I>(texts: I, space: Space) -> Vec<WordObject>
where
    I: IntoIterator<Item = TextObject>,
{
    let mut words = Vec::new();
    let mut glyphs: Vec<GlyphObject> = Vec::new();
    let mut next_origin: Option<Point> = None;
    for text in texts {
        for glyph in text.glyphs {
            if let Some(origin) = next_origin {
                let new_page = glyphs
                    .first()
                    .is_some_and(|first| first.page_index != glyph.page_index);
                if !glyphs.is_empty()
                    && (new_page
                        || word_break(&glyph, origin)
                        || line_break(&glyph, origin, space))
                {
                    words.push(WordObject {
                        page_index: glyphs[0].page_index,
                        glyphs: std::mem::take(&mut glyphs),
                        next_origin: origin,
                    });
                }
            }
            next_origin = Some(glyph.next_origin());
            if glyph.text.is_some() && !glyph.is_space() {
                glyphs.push(glyph);
            }
        }
    }
    if let (Some(origin), false) = (next_origin, glyphs.is_empty()) {
        words.push(WordObject {
            page_index: glyphs[0].page_index,
            glyphs,
            next_origin: origin,
        });
    }
    words
}

/// Extract words from a document, page list or page.
pub fn words<'a>(source: impl Into<PdfSource<'a>>) -> Result<Vec<WordObject>> {
    let source = source.into();
    source.with_document(|doc, indices| {
        let mut texts = Vec::new();
        for &index in indices {
            texts.extend(doc.page(index)?.texts()?);
        }
        Ok(words_from(texts, doc.space()))
    })
}

//! Fonts as far as text extraction needs them
//!
//! A [`Font`] knows how to split a string operand into character codes,
//! map codes to CIDs and Unicode text, and report glyph displacements
//! and vertical extents. Loading is lenient: broken dictionaries give a
//! usable font with default metrics and a warning.

pub mod cmap;
pub mod encoding;
pub mod metrics;

pub use cmap::CMap;
pub use encoding::{glyph_to_unicode, BaseEncoding};
pub use metrics::StandardMetrics;

use crate::geometry::Matrix;
use crate::pdfobj;
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;
use tracing::{debug, warn};

const DEFAULT_ASCENT: f64 = 0.75;
const DEFAULT_DESCENT: f64 = -0.25;

/// Vertical metrics of one CID, in text space units per unit font size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalMetrics {
    /// Vertical displacement (negative, downward)
    pub w1: f64,
    /// Position vector from horizontal to vertical origin
    pub vx: f64,
    pub vy: f64,
}

/// A loaded font
#[derive(Debug, Clone)]
pub struct Font {
    pub basefont: String,
    pub subtype: String,
    pub vertical: bool,
    /// Ascent and descent as a fraction of the font size
    pub ascent: f64,
    pub descent: f64,
    composite: bool,
    widths: HashMap<u32, f64>,
    default_width: f64,
    vertical_metrics: HashMap<u32, (f64, f64, f64)>,
    default_vertical: (f64, f64),
    standard: Option<StandardMetrics>,
    code_cmap: Option<CMap>,
    to_unicode: Option<CMap>,
    simple_encoding: Vec<Option<String>>,
}

impl Default for Font {
    fn default() -> Self {
        let table = BaseEncoding::StandardEncoding.table();
        Self {
            basefont: "unknown".to_string(),
            subtype: "Type1".to_string(),
            vertical: false,
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
            composite: false,
            widths: HashMap::new(),
            default_width: 0.0,
            vertical_metrics: HashMap::new(),
            default_vertical: (0.88, -1.0),
            standard: Some(StandardMetrics::for_font("Helvetica")),
            code_cmap: None,
            to_unicode: None,
            simple_encoding: table.iter().map(|c| c.map(String::from)).collect(),
        }
    }
}

impl Font {
    /// Load a font from its dictionary.
    pub fn load(doc: &Document, dict: &Dictionary) -> Font {
        let subtype = pdfobj::get_name(doc, dict, b"Subtype").unwrap_or_else(|| "Type1".into());
        let basefont = pdfobj::get_name(doc, dict, b"BaseFont")
            .or_else(|| pdfobj::get_name(doc, dict, b"Name"))
            .unwrap_or_else(|| "unknown".into());
        let mut font = Font {
            basefont,
            subtype,
            standard: None,
            ..Default::default()
        };

        if font.subtype == "Type0" {
            font.load_composite(doc, dict);
        } else {
            font.load_simple(doc, dict);
        }

        if let Some(stream) = pdfobj::get_stream(doc, dict, b"ToUnicode") {
            match CMap::parse(&pdfobj::stream_data(stream)) {
                Ok(cmap) => font.to_unicode = Some(cmap),
                Err(e) => warn!("Invalid ToUnicode CMap in {}: {e}", font.basefont),
            }
        }

        debug!(
            "Loaded {} font {} (composite: {}, vertical: {})",
            font.subtype, font.basefont, font.composite, font.vertical
        );
        font
    }

    fn load_descriptor(&mut self, doc: &Document, descriptor: Option<&Dictionary>) {
        let Some(descriptor) = descriptor else {
            return;
        };
        let ascent = pdfobj::get_number(doc, descriptor, b"Ascent").unwrap_or(0.0);
        let descent = pdfobj::get_number(doc, descriptor, b"Descent").unwrap_or(0.0);
        if ascent != 0.0 || descent != 0.0 {
            self.ascent = ascent / 1000.0;
            self.descent = (-descent.abs()) / 1000.0;
        }
    }

    fn load_simple(&mut self, doc: &Document, dict: &Dictionary) {
        let descriptor = pdfobj::get_dict(doc, dict, b"FontDescriptor");
        self.load_descriptor(doc, descriptor);

        // Type3 glyph space is given by FontMatrix, others use 1/1000 em
        let font_matrix = (self.subtype == "Type3")
            .then(|| pdfobj::get_matrix(doc, dict, b"FontMatrix"))
            .flatten();
        let to_em = |width: f64| match font_matrix {
            Some(matrix) => width * matrix.a(),
            None => width / 1000.0,
        };

        let first_char = pdfobj::get_number(doc, dict, b"FirstChar").unwrap_or(0.0) as u32;
        if let Some(widths) = pdfobj::get_array(doc, dict, b"Widths") {
            for (i, item) in widths.iter().enumerate() {
                if let Some(width) = pdfobj::resolve(doc, item).and_then(pdfobj::as_number) {
                    self.widths.insert(first_char + i as u32, to_em(width));
                }
            }
            self.default_width = to_em(
                descriptor
                    .and_then(|d| pdfobj::get_number(doc, d, b"MissingWidth"))
                    .unwrap_or(0.0),
            );
        } else if self.subtype != "Type3" {
            self.standard = Some(StandardMetrics::for_font(&self.basefont));
        }

        let symbolic = matches!(self.basefont.as_str(), "Symbol" | "ZapfDingbats");
        let mut base = if symbolic {
            None
        } else {
            Some(BaseEncoding::StandardEncoding)
        };
        let mut differences: Vec<(u8, String)> = Vec::new();
        match pdfobj::get(doc, dict, b"Encoding") {
            Some(Object::Name(name)) => {
                base = BaseEncoding::from_name(&String::from_utf8_lossy(name)).or(base);
            }
            Some(Object::Dictionary(enc)) => {
                if let Some(name) = pdfobj::get_name(doc, enc, b"BaseEncoding") {
                    base = BaseEncoding::from_name(&name).or(base);
                }
                if let Some(items) = pdfobj::get_array(doc, enc, b"Differences") {
                    differences = parse_differences(doc, items);
                }
            }
            _ => {}
        }

        let table = base.map(|b| b.table()).unwrap_or([None; 256]);
        self.simple_encoding = table.iter().map(|c| c.map(String::from)).collect();
        for (code, name) in differences {
            self.simple_encoding[code as usize] = glyph_to_unicode(&name);
        }
    }

    fn load_composite(&mut self, doc: &Document, dict: &Dictionary) {
        self.composite = true;
        self.default_width = 1.0;

        let cmap = match pdfobj::get(doc, dict, b"Encoding") {
            Some(Object::Name(name)) => {
                let name = String::from_utf8_lossy(name);
                if !name.starts_with("Identity") {
                    debug!("Predefined CMap {name} not available, treating as Identity");
                }
                CMap::identity(name.ends_with("-V"))
            }
            Some(Object::Stream(stream)) => match CMap::parse(&pdfobj::stream_data(stream)) {
                Ok(cmap) => cmap,
                Err(e) => {
                    warn!("Invalid encoding CMap in {}: {e}", self.basefont);
                    CMap::identity(false)
                }
            },
            _ => CMap::identity(false),
        };
        self.vertical = cmap.wmode == 1;
        self.code_cmap = Some(cmap);

        let descendant = pdfobj::get_array(doc, dict, b"DescendantFonts")
            .and_then(|fonts| fonts.first())
            .and_then(|obj| pdfobj::resolve(doc, obj))
            .and_then(pdfobj::as_dict);
        let Some(descendant) = descendant else {
            warn!("Composite font {} has no descendant font", self.basefont);
            return;
        };

        self.load_descriptor(doc, pdfobj::get_dict(doc, descendant, b"FontDescriptor"));
        if let Some(dw) = pdfobj::get_number(doc, descendant, b"DW") {
            self.default_width = dw / 1000.0;
        }
        if let Some(w) = pdfobj::get_array(doc, descendant, b"W") {
            for (cid, values) in parse_cid_widths(doc, w, 1) {
                self.widths.insert(cid, values[0] / 1000.0);
            }
        }
        if let Some(dw2) = pdfobj::get_array(doc, descendant, b"DW2") {
            let values = pdfobj::numbers(doc, dw2);
            if values.len() == 2 {
                self.default_vertical = (values[0] / 1000.0, values[1] / 1000.0);
            }
        }
        if let Some(w2) = pdfobj::get_array(doc, descendant, b"W2") {
            for (cid, values) in parse_cid_widths(doc, w2, 3) {
                self.vertical_metrics.insert(
                    cid,
                    (values[0] / 1000.0, values[1] / 1000.0, values[2] / 1000.0),
                );
            }
        }
    }

    pub fn is_composite(&self) -> bool {
        self.composite
    }

    /// Split a string operand into `(code, cid)` pairs.
    pub fn decode(&self, bytes: &[u8]) -> Vec<(Vec<u8>, u32)> {
        match &self.code_cmap {
            Some(cmap) => cmap
                .split_codes(bytes, 2)
                .into_iter()
                .map(|code| {
                    let cid = cmap.cid(&code);
                    (code, cid)
                })
                .collect(),
            None => bytes.iter().map(|&b| (vec![b], b as u32)).collect(),
        }
    }

    /// Unicode text of a code: ToUnicode first, then the simple encoding.
    pub fn unicode(&self, code: &[u8]) -> Option<String> {
        if let Some(text) = self.to_unicode.as_ref().and_then(|cmap| cmap.unicode(code)) {
            return Some(text);
        }
        if self.composite || code.len() != 1 {
            return None;
        }
        self.simple_encoding
            .get(code[0] as usize)
            .cloned()
            .flatten()
    }

    /// Horizontal displacement of a glyph per unit font size
    pub fn hdisp(&self, cid: u32) -> f64 {
        if let Some(width) = self.widths.get(&cid) {
            return *width;
        }
        match (&self.standard, u8::try_from(cid)) {
            (Some(metrics), Ok(code)) => metrics.width(code) / 1000.0,
            _ => self.default_width,
        }
    }

    /// Vertical metrics of a glyph per unit font size
    pub fn vdisp(&self, cid: u32) -> VerticalMetrics {
        match self.vertical_metrics.get(&cid) {
            Some(&(w1, vx, vy)) => VerticalMetrics { w1, vx, vy },
            None => VerticalMetrics {
                w1: self.default_vertical.1,
                vx: self.hdisp(cid) / 2.0,
                vy: self.default_vertical.0,
            },
        }
    }
}

/// `Differences` array: a code followed by glyph names for consecutive codes
fn parse_differences(doc: &Document, items: &[Object]) -> Vec<(u8, String)> {
    let mut result = Vec::new();
    let mut code: i64 = 0;
    for item in items {
        match pdfobj::resolve(doc, item) {
            Some(Object::Integer(start)) => code = *start,
            Some(Object::Name(name)) => {
                if let Ok(c) = u8::try_from(code) {
                    result.push((c, String::from_utf8_lossy(name).into_owned()));
                }
                code += 1;
            }
            _ => {}
        }
    }
    result
}

/// `W`/`W2` arrays: `c [v...]` lists or `cfirst clast v` ranges, with
/// `n` values per CID.
fn parse_cid_widths(doc: &Document, items: &[Object], n: usize) -> Vec<(u32, Vec<f64>)> {
    let mut result = Vec::new();
    let mut pending: Vec<f64> = Vec::new();
    for item in items {
        match pdfobj::resolve(doc, item) {
            Some(Object::Array(values)) => {
                if let Some(&start) = pending.first() {
                    let values = pdfobj::numbers(doc, values);
                    for (i, chunk) in values.chunks_exact(n).enumerate() {
                        result.push((start as u32 + i as u32, chunk.to_vec()));
                    }
                }
                pending.clear();
            }
            Some(obj) => {
                if let Some(value) = pdfobj::as_number(obj) {
                    pending.push(value);
                }
                if pending.len() == 2 + n {
                    let (first, last) = (pending[0] as u32, pending[1] as u32);
                    for cid in first..=last.min(first.saturating_add(0xFFFF)) {
                        result.push((cid, pending[2..].to_vec()));
                    }
                    pending.clear();
                }
            }
            None => {}
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    #[test]
    fn test_standard_font_without_widths() {
        let doc = Document::with_version("1.7");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        };
        let font = Font::load(&doc, &dict);
        assert_eq!(font.basefont, "Helvetica");
        assert!(!font.is_composite());
        assert_eq!(font.hdisp(b'A' as u32), 0.667);
        assert_eq!(font.unicode(b"A").as_deref(), Some("A"));
        assert_eq!(font.ascent, DEFAULT_ASCENT);
        assert_eq!(font.descent, DEFAULT_DESCENT);
    }

    #[test]
    fn test_simple_font_widths_and_differences() {
        let doc = Document::with_version("1.7");
        let dict = dictionary! {
            "Subtype" => "TrueType",
            "BaseFont" => "ABCDEF+Custom",
            "FirstChar" => 65,
            "Widths" => vec![Object::Integer(500), Object::Integer(250)],
            "Encoding" => dictionary! {
                "BaseEncoding" => "WinAnsiEncoding",
                "Differences" => vec![
                    Object::Integer(66),
                    Object::Name(b"eacute".to_vec()),
                    Object::Name(b"fi".to_vec()),
                ],
            },
            "FontDescriptor" => dictionary! {
                "Ascent" => 800,
                "Descent" => -200,
                "MissingWidth" => 300,
            },
        };
        let font = Font::load(&doc, &dict);
        assert_eq!(font.hdisp(65), 0.5);
        assert_eq!(font.hdisp(66), 0.25);
        assert_eq!(font.hdisp(90), 0.3);
        assert_eq!(font.unicode(b"A").as_deref(), Some("A"));
        assert_eq!(font.unicode(b"B").as_deref(), Some("é"));
        assert_eq!(font.unicode(b"C").as_deref(), Some("\u{FB01}"));
        assert_eq!(font.unicode(&[0x80]).as_deref(), Some("€"));
        assert_eq!(font.ascent, 0.8);
        assert_eq!(font.descent, -0.2);
    }

    #[test]
    fn test_composite_font() {
        let mut doc = Document::with_version("1.7");
        let to_unicode = doc.add_object(Stream::new(
            dictionary! {},
            b"1 begincodespacerange <0000> <FFFF> endcodespacerange
1 beginbfchar <0005> <0048> endbfchar"
                .to_vec(),
        ));
        let dict = dictionary! {
            "Subtype" => "Type0",
            "BaseFont" => "NotoSans",
            "Encoding" => "Identity-H",
            "ToUnicode" => Object::Reference(to_unicode),
            "DescendantFonts" => vec![Object::Dictionary(dictionary! {
                "Subtype" => "CIDFontType2",
                "DW" => 1000,
                "W" => vec![
                    Object::Integer(5),
                    Object::Array(vec![Object::Integer(600), Object::Integer(700)]),
                    Object::Integer(10),
                    Object::Integer(12),
                    Object::Integer(400),
                ],
            })],
        };
        let font = Font::load(&doc, &dict);
        assert!(font.is_composite());
        assert!(!font.vertical);
        let decoded = font.decode(&[0x00, 0x05, 0x00, 0x0B]);
        assert_eq!(decoded, vec![(vec![0x00, 0x05], 5), (vec![0x00, 0x0B], 11)]);
        assert_eq!(font.hdisp(5), 0.6);
        assert_eq!(font.hdisp(6), 0.7);
        assert_eq!(font.hdisp(11), 0.4);
        assert_eq!(font.hdisp(99), 1.0);
        assert_eq!(font.unicode(&[0x00, 0x05]).as_deref(), Some("H"));
        assert_eq!(font.unicode(&[0x00, 0x0B]), None);
    }

    #[test]
    fn test_vertical_font_defaults() {
        let doc = Document::with_version("1.7");
        let dict = dictionary! {
            "Subtype" => "Type0",
            "BaseFont" => "MS-Mincho",
            "Encoding" => "Identity-V",
            "DescendantFonts" => vec![Object::Dictionary(dictionary! {
                "Subtype" => "CIDFontType0",
            })],
        };
        let font = Font::load(&doc, &dict);
        assert!(font.vertical);
        let metrics = font.vdisp(42);
        assert_eq!(metrics.w1, -1.0);
        assert_eq!(metrics.vy, 0.88);
        assert_eq!(metrics.vx, 0.5);
    }
}

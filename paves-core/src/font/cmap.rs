//! CMap and ToUnicode support
//!
//! CMaps map byte strings to character codes, CIDs and Unicode text
//! (ISO 32000-1:2008 Section 9.7.5 and 9.10.3). Embedded CMaps are
//! PostScript fragments; they are read with the content stream
//! tokenizer, so several mappings on one line are handled.

use crate::content::parser::{ContentTokenizer, Token};
use crate::content::ParseResult;
use std::collections::HashMap;

/// Character code range of a codespace
#[derive(Debug, Clone, PartialEq)]
pub struct CodeRange {
    pub start: Vec<u8>,
    pub end: Vec<u8>,
}

impl CodeRange {
    /// Check if a code is within this range, byte by byte
    pub fn contains(&self, code: &[u8]) -> bool {
        code.len() == self.start.len()
            && code.len() == self.end.len()
            && code
                .iter()
                .zip(self.start.iter().zip(&self.end))
                .all(|(c, (lo, hi))| lo <= c && c <= hi)
    }
}

#[derive(Debug, Clone)]
struct Range<T> {
    start: Vec<u8>,
    end: Vec<u8>,
    dst: T,
}

/// A parsed CMap
#[derive(Debug, Clone, Default)]
pub struct CMap {
    pub name: Option<String>,
    /// Writing mode (0 = horizontal, 1 = vertical)
    pub wmode: u8,
    codespace: Vec<CodeRange>,
    identity: bool,
    unicode: HashMap<Vec<u8>, String>,
    unicode_ranges: Vec<Range<Vec<u8>>>,
    cids: HashMap<Vec<u8>, u32>,
    cid_ranges: Vec<Range<u32>>,
}

pub(crate) fn code_value(code: &[u8]) -> u32 {
    code.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn offset_in(code: &[u8], start: &[u8]) -> u32 {
    code_value(code).saturating_sub(code_value(start))
}

fn in_range(code: &[u8], start: &[u8], end: &[u8]) -> bool {
    code.len() == start.len() && start <= code && code <= end
}

/// Interpret mapped bytes as UTF-16BE text.
fn utf16be(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    if bytes.len() % 2 == 1 {
        // Single-byte destinations show up in sloppy producers
        return Some(bytes.iter().map(|&b| b as char).collect());
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    Some(String::from_utf16_lossy(&units))
}

impl CMap {
    /// Create a predefined Identity CMap (two-byte codes, CID = code)
    pub fn identity(vertical: bool) -> Self {
        Self {
            name: Some(if vertical { "Identity-V" } else { "Identity-H" }.to_string()),
            wmode: vertical as u8,
            codespace: vec![CodeRange {
                start: vec![0x00, 0x00],
                end: vec![0xFF, 0xFF],
            }],
            identity: true,
            ..Default::default()
        }
    }

    /// Parse an embedded CMap or ToUnicode stream.
    pub fn parse(data: &[u8]) -> ParseResult<Self> {
        let mut cmap = Self::default();
        let mut tokenizer = ContentTokenizer::new(data);
        let mut previous: Option<Token> = None;

        while let Some(token) = tokenizer.next_token()? {
            match &token {
                Token::Keyword(keyword) => match keyword.as_str() {
                    "begincodespacerange" => cmap.read_codespace(&mut tokenizer)?,
                    "beginbfchar" => cmap.read_bfchar(&mut tokenizer)?,
                    "beginbfrange" => cmap.read_bfrange(&mut tokenizer)?,
                    "begincidchar" => cmap.read_cidchar(&mut tokenizer)?,
                    "begincidrange" => cmap.read_cidrange(&mut tokenizer)?,
                    _ => {}
                },
                Token::Name(name) if name == "CMapName" => {
                    if let Some(Token::Name(value)) = tokenizer.next_token()? {
                        cmap.name = Some(value);
                    }
                }
                Token::Integer(value) => {
                    if let Some(Token::Name(key)) = &previous {
                        if key == "WMode" {
                            cmap.wmode = (*value == 1) as u8;
                        }
                    }
                }
                _ => {}
            }
            previous = Some(token);
        }

        Ok(cmap)
    }

    fn read_strings(
        tokenizer: &mut ContentTokenizer<'_>,
        end: &str,
    ) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = tokenizer.next_token()? {
            match token {
                Token::Keyword(ref k) if k == end => break,
                Token::ArrayStart => {
                    // bfrange destinations given as an array of strings
                    let mut items = Vec::new();
                    while let Some(item) = tokenizer.next_token()? {
                        match item {
                            Token::ArrayEnd => break,
                            Token::String(s) => items.push(s),
                            _ => {}
                        }
                    }
                    tokens.push(Token::Keyword(String::new()));
                    tokens.extend(items.into_iter().map(Token::String));
                    tokens.push(Token::ArrayEnd);
                }
                other => tokens.push(other),
            }
        }
        Ok(tokens)
    }

    fn read_codespace(&mut self, tokenizer: &mut ContentTokenizer<'_>) -> ParseResult<()> {
        let tokens = Self::read_strings(tokenizer, "endcodespacerange")?;
        for pair in tokens.chunks_exact(2) {
            if let [Token::String(start), Token::String(end)] = pair {
                self.codespace.push(CodeRange {
                    start: start.clone(),
                    end: end.clone(),
                });
            }
        }
        Ok(())
    }

    fn read_bfchar(&mut self, tokenizer: &mut ContentTokenizer<'_>) -> ParseResult<()> {
        let tokens = Self::read_strings(tokenizer, "endbfchar")?;
        for pair in tokens.chunks_exact(2) {
            match pair {
                [Token::String(src), Token::String(dst)] => {
                    if let Some(text) = utf16be(dst) {
                        self.unicode.insert(src.clone(), text);
                    }
                }
                [Token::String(src), Token::Name(glyph)] => {
                    if let Some(text) = super::encoding::glyph_to_unicode(glyph) {
                        self.unicode.insert(src.clone(), text);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn read_bfrange(&mut self, tokenizer: &mut ContentTokenizer<'_>) -> ParseResult<()> {
        let tokens = Self::read_strings(tokenizer, "endbfrange")?;
        let mut iter = tokens.into_iter();
        while let (Some(start), Some(end), Some(dst)) = (iter.next(), iter.next(), iter.next()) {
            let (Token::String(start), Token::String(end)) = (start, end) else {
                continue;
            };
            match dst {
                Token::String(dst) => self.unicode_ranges.push(Range { start, end, dst }),
                Token::Keyword(_) => {
                    // Array form: one destination per code
                    let mut code = start.clone();
                    for item in iter.by_ref() {
                        match item {
                            Token::String(dst) => {
                                if let Some(text) = utf16be(&dst) {
                                    self.unicode.insert(code.clone(), text);
                                }
                                increment(&mut code);
                            }
                            _ => break,
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn read_cidchar(&mut self, tokenizer: &mut ContentTokenizer<'_>) -> ParseResult<()> {
        let tokens = Self::read_strings(tokenizer, "endcidchar")?;
        for pair in tokens.chunks_exact(2) {
            if let [Token::String(src), Token::Integer(cid)] = pair {
                self.cids.insert(src.clone(), *cid as u32);
            }
        }
        Ok(())
    }

    fn read_cidrange(&mut self, tokenizer: &mut ContentTokenizer<'_>) -> ParseResult<()> {
        let tokens = Self::read_strings(tokenizer, "endcidrange")?;
        for triple in tokens.chunks_exact(3) {
            if let [Token::String(start), Token::String(end), Token::Integer(cid)] = triple {
                self.cid_ranges.push(Range {
                    start: start.clone(),
                    end: end.clone(),
                    dst: *cid as u32,
                });
            }
        }
        Ok(())
    }

    /// Whether a code is inside one of the codespace ranges
    pub fn is_valid_code(&self, code: &[u8]) -> bool {
        self.codespace.iter().any(|range| range.contains(code))
    }

    /// Split a byte string into character codes according to the
    /// codespace. Without a codespace, codes are `default_len` bytes.
    pub fn split_codes(&self, bytes: &[u8], default_len: usize) -> Vec<Vec<u8>> {
        let mut codes = Vec::new();
        let mut pos = 0;
        while pos < bytes.len() {
            let len = (1..=4)
                .filter(|len| pos + len <= bytes.len())
                .find(|&len| self.is_valid_code(&bytes[pos..pos + len]))
                .unwrap_or_else(|| {
                    self.codespace
                        .iter()
                        .map(|range| range.start.len())
                        .min()
                        .unwrap_or(default_len)
                        .clamp(1, bytes.len() - pos)
                });
            codes.push(bytes[pos..pos + len].to_vec());
            pos += len;
        }
        codes
    }

    /// The CID selected by a code.
    pub fn cid(&self, code: &[u8]) -> u32 {
        if self.identity || (self.cids.is_empty() && self.cid_ranges.is_empty()) {
            return code_value(code);
        }
        if let Some(cid) = self.cids.get(code) {
            return *cid;
        }
        self.cid_ranges
            .iter()
            .find(|range| in_range(code, &range.start, &range.end))
            .map(|range| range.dst + offset_in(code, &range.start))
            .unwrap_or(0)
    }

    /// Unicode text for a code, if the CMap maps it.
    pub fn unicode(&self, code: &[u8]) -> Option<String> {
        if let Some(text) = self.unicode.get(code) {
            return Some(text.clone());
        }
        let range = self
            .unicode_ranges
            .iter()
            .find(|range| in_range(code, &range.start, &range.end))?;
        let mut dst = range.dst.clone();
        add_to_last_unit(&mut dst, offset_in(code, &range.start));
        utf16be(&dst)
    }

    pub fn has_unicode(&self) -> bool {
        !self.unicode.is_empty() || !self.unicode_ranges.is_empty()
    }
}

/// Big-endian increment of a code
fn increment(code: &mut [u8]) {
    for byte in code.iter_mut().rev() {
        let (value, overflow) = byte.overflowing_add(1);
        *byte = value;
        if !overflow {
            break;
        }
    }
}

/// Add an offset to the final UTF-16 unit of a destination string
fn add_to_last_unit(dst: &mut [u8], offset: u32) {
    if dst.len() >= 2 {
        let n = dst.len();
        let unit = u16::from_be_bytes([dst[n - 2], dst[n - 1]]);
        let [hi, lo] = unit.wrapping_add(offset as u16).to_be_bytes();
        dst[n - 2] = hi;
        dst[n - 1] = lo;
    } else if let Some(last) = dst.last_mut() {
        *last = last.wrapping_add(offset as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TO_UNICODE: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020> <0011> <0041>
endbfchar
2 beginbfrange
<0020> <0022> <0061>
<0030> <0031> [<0066006C> <00E9>]
endbfrange
endcmap";

    #[test]
    fn test_parse_to_unicode() {
        let cmap = CMap::parse(TO_UNICODE).unwrap();
        assert_eq!(cmap.name.as_deref(), Some("Adobe-Identity-UCS"));
        assert_eq!(cmap.unicode(&[0x00, 0x03]).as_deref(), Some(" "));
        assert_eq!(cmap.unicode(&[0x00, 0x11]).as_deref(), Some("A"));
        assert_eq!(cmap.unicode(&[0x00, 0x21]).as_deref(), Some("b"));
        assert_eq!(cmap.unicode(&[0x00, 0x30]).as_deref(), Some("fl"));
        assert_eq!(cmap.unicode(&[0x00, 0x31]).as_deref(), Some("é"));
        assert_eq!(cmap.unicode(&[0x00, 0x40]), None);
    }

    #[test]
    fn test_split_codes_by_codespace() {
        let mut cmap = CMap::default();
        cmap.codespace.push(CodeRange {
            start: vec![0x00],
            end: vec![0x80],
        });
        cmap.codespace.push(CodeRange {
            start: vec![0x81, 0x40],
            end: vec![0x9F, 0xFC],
        });
        let codes = cmap.split_codes(&[0x41, 0x81, 0x50, 0x42], 1);
        assert_eq!(codes, vec![vec![0x41], vec![0x81, 0x50], vec![0x42]]);
    }

    #[test]
    fn test_identity() {
        let cmap = CMap::identity(false);
        assert_eq!(cmap.wmode, 0);
        assert_eq!(cmap.split_codes(&[0x01, 0x02, 0x00, 0x41], 2).len(), 2);
        assert_eq!(cmap.cid(&[0x01, 0x02]), 0x0102);
        assert!(CMap::identity(true).wmode == 1);
    }

    #[test]
    fn test_cid_ranges_and_wmode() {
        let data = b"/WMode 1 def 1 begincodespacerange <00> <FF> endcodespacerange
1 begincidrange <20> <7E> 1 endcidrange 1 begincidchar <80> 500 endcidchar";
        let cmap = CMap::parse(data).unwrap();
        assert_eq!(cmap.wmode, 1);
        assert_eq!(cmap.cid(&[0x20]), 1);
        assert_eq!(cmap.cid(&[0x41]), 34);
        assert_eq!(cmap.cid(&[0x80]), 500);
        assert_eq!(cmap.cid(&[0x10]), 0);
    }
}

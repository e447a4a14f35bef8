//! Simple font encodings and glyph names
//!
//! Base encodings map single-byte codes to Unicode. `Differences`
//! arrays name glyphs, which are resolved through [`glyph_to_unicode`].

/// Base encodings of simple fonts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEncoding {
    StandardEncoding,
    WinAnsiEncoding,
    MacRomanEncoding,
}

/// Glyph names of the printable ASCII range (0x20..=0x7E), in order.
const ASCII_NAMES: [&str; 95] = [
    "space", "exclam", "quotedbl", "numbersign", "dollar", "percent", "ampersand",
    "quotesingle", "parenleft", "parenright", "asterisk", "plus", "comma", "hyphen",
    "period", "slash", "zero", "one", "two", "three", "four", "five", "six", "seven",
    "eight", "nine", "colon", "semicolon", "less", "equal", "greater", "question", "at",
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q",
    "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "bracketleft", "backslash",
    "bracketright", "asciicircum", "underscore", "grave", "a", "b", "c", "d", "e", "f",
    "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u", "v", "w",
    "x", "y", "z", "braceleft", "bar", "braceright", "asciitilde",
];

/// Glyph names of the Latin-1 range (0xA0..=0xFF), in order.
const LATIN1_NAMES: [&str; 96] = [
    "nbspace", "exclamdown", "cent", "sterling", "currency", "yen", "brokenbar",
    "section", "dieresis", "copyright", "ordfeminine", "guillemotleft", "logicalnot",
    "sfthyphen", "registered", "macron", "degree", "plusminus", "twosuperior",
    "threesuperior", "acute", "mu", "paragraph", "periodcentered", "cedilla",
    "onesuperior", "ordmasculine", "guillemotright", "onequarter", "onehalf",
    "threequarters", "questiondown", "Agrave", "Aacute", "Acircumflex", "Atilde",
    "Adieresis", "Aring", "AE", "Ccedilla", "Egrave", "Eacute", "Ecircumflex",
    "Edieresis", "Igrave", "Iacute", "Icircumflex", "Idieresis", "Eth", "Ntilde",
    "Ograve", "Oacute", "Ocircumflex", "Otilde", "Odieresis", "multiply", "Oslash",
    "Ugrave", "Uacute", "Ucircumflex", "Udieresis", "Yacute", "Thorn", "germandbls",
    "agrave", "aacute", "acircumflex", "atilde", "adieresis", "aring", "ae", "ccedilla",
    "egrave", "eacute", "ecircumflex", "edieresis", "igrave", "iacute", "icircumflex",
    "idieresis", "eth", "ntilde", "ograve", "oacute", "ocircumflex", "otilde",
    "odieresis", "divide", "oslash", "ugrave", "uacute", "ucircumflex", "udieresis",
    "yacute", "thorn", "ydieresis",
];

/// Windows-1252 specific mappings (0x80..=0x9F)
const WIN_ANSI_HIGH: [(u8, &str, char); 27] = [
    (0x80, "Euro", '\u{20AC}'),
    (0x82, "quotesinglbase", '\u{201A}'),
    (0x83, "florin", '\u{0192}'),
    (0x84, "quotedblbase", '\u{201E}'),
    (0x85, "ellipsis", '\u{2026}'),
    (0x86, "dagger", '\u{2020}'),
    (0x87, "daggerdbl", '\u{2021}'),
    (0x88, "circumflex", '\u{02C6}'),
    (0x89, "perthousand", '\u{2030}'),
    (0x8A, "Scaron", '\u{0160}'),
    (0x8B, "guilsinglleft", '\u{2039}'),
    (0x8C, "OE", '\u{0152}'),
    (0x8E, "Zcaron", '\u{017D}'),
    (0x91, "quoteleft", '\u{2018}'),
    (0x92, "quoteright", '\u{2019}'),
    (0x93, "quotedblleft", '\u{201C}'),
    (0x94, "quotedblright", '\u{201D}'),
    (0x95, "bullet", '\u{2022}'),
    (0x96, "endash", '\u{2013}'),
    (0x97, "emdash", '\u{2014}'),
    (0x98, "tilde", '\u{02DC}'),
    (0x99, "trademark", '\u{2122}'),
    (0x9A, "scaron", '\u{0161}'),
    (0x9B, "guilsinglright", '\u{203A}'),
    (0x9C, "oe", '\u{0153}'),
    (0x9E, "zcaron", '\u{017E}'),
    (0x9F, "Ydieresis", '\u{0178}'),
];

/// Glyphs that appear in Standard or MacRoman encodings, or commonly in
/// `Differences`, beyond the ranges above.
const OTHER_GLYPHS: [(&str, char); 36] = [
    ("quoteleft", '\u{2018}'),
    ("quoteright", '\u{2019}'),
    ("fi", '\u{FB01}'),
    ("fl", '\u{FB02}'),
    ("ff", '\u{FB00}'),
    ("ffi", '\u{FB03}'),
    ("ffl", '\u{FB04}'),
    ("fraction", '\u{2044}'),
    ("dotlessi", '\u{0131}'),
    ("Lslash", '\u{0141}'),
    ("lslash", '\u{0142}'),
    ("breve", '\u{02D8}'),
    ("dotaccent", '\u{02D9}'),
    ("ring", '\u{02DA}'),
    ("ogonek", '\u{02DB}'),
    ("caron", '\u{02C7}'),
    ("hungarumlaut", '\u{02DD}'),
    ("minus", '\u{2212}'),
    ("notequal", '\u{2260}'),
    ("infinity", '\u{221E}'),
    ("lessequal", '\u{2264}'),
    ("greaterequal", '\u{2265}'),
    ("partialdiff", '\u{2202}'),
    ("summation", '\u{2211}'),
    ("product", '\u{220F}'),
    ("pi", '\u{03C0}'),
    ("integral", '\u{222B}'),
    ("Omega", '\u{2126}'),
    ("radical", '\u{221A}'),
    ("approxequal", '\u{2248}'),
    ("Delta", '\u{2206}'),
    ("lozenge", '\u{25CA}'),
    ("apple", '\u{F8FF}'),
    ("space", ' '),
    ("hyphen", '-'),
    ("nonbreakingspace", '\u{00A0}'),
];

/// StandardEncoding upper half, as (code, glyph name)
const STANDARD_HIGH: [(u8, &str); 55] = [
    (0xA1, "exclamdown"), (0xA2, "cent"), (0xA3, "sterling"), (0xA4, "fraction"),
    (0xA5, "yen"), (0xA6, "florin"), (0xA7, "section"), (0xA8, "currency"),
    (0xA9, "quotesingle"), (0xAA, "quotedblleft"), (0xAB, "guillemotleft"),
    (0xAC, "guilsinglleft"), (0xAD, "guilsinglright"), (0xAE, "fi"), (0xAF, "fl"),
    (0xB1, "endash"), (0xB2, "dagger"), (0xB3, "daggerdbl"), (0xB4, "periodcentered"),
    (0xB6, "paragraph"), (0xB7, "bullet"), (0xB8, "quotesinglbase"),
    (0xB9, "quotedblbase"), (0xBA, "quotedblright"), (0xBB, "guillemotright"),
    (0xBC, "ellipsis"), (0xBD, "perthousand"), (0xBF, "questiondown"), (0xC1, "grave"),
    (0xC2, "acute"), (0xC3, "circumflex"), (0xC4, "tilde"), (0xC5, "macron"),
    (0xC6, "breve"), (0xC7, "dotaccent"), (0xC8, "dieresis"), (0xCA, "ring"),
    (0xCB, "cedilla"), (0xCD, "hungarumlaut"), (0xCE, "ogonek"), (0xCF, "caron"),
    (0xD0, "emdash"), (0xE1, "AE"), (0xE3, "ordfeminine"), (0xE8, "Lslash"),
    (0xE9, "Oslash"), (0xEA, "OE"), (0xEB, "ordmasculine"), (0xF1, "ae"),
    (0xF5, "dotlessi"), (0xF8, "lslash"), (0xF9, "oslash"), (0xFA, "oe"),
    (0xFB, "germandbls"), (0xFF, "ydieresis"),
];

/// MacRomanEncoding upper half (0x80..=0xFF)
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è',
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü',
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø',
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø',
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{00A0}', 'À', 'Ã', 'Õ', 'Œ', 'œ',
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '€', '‹', '›', 'ﬁ', 'ﬂ',
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô',
    '\u{F8FF}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
];

impl BaseEncoding {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "StandardEncoding" => Some(BaseEncoding::StandardEncoding),
            "WinAnsiEncoding" => Some(BaseEncoding::WinAnsiEncoding),
            "MacRomanEncoding" => Some(BaseEncoding::MacRomanEncoding),
            _ => None,
        }
    }

    /// Decode a single code to a character
    pub fn decode(&self, code: u8) -> Option<char> {
        match self {
            BaseEncoding::StandardEncoding => match code {
                0x27 => Some('\u{2019}'),
                0x60 => Some('\u{2018}'),
                0x20..=0x7E => Some(code as char),
                _ => STANDARD_HIGH
                    .iter()
                    .find(|(c, _)| *c == code)
                    .and_then(|(_, name)| glyph_char(name)),
            },
            BaseEncoding::WinAnsiEncoding => match code {
                0x20..=0x7E => Some(code as char),
                // bullet is used for undefined codes
                0x7F | 0x81 | 0x8D | 0x8F | 0x90 | 0x9D => Some('\u{2022}'),
                0x80..=0x9F => WIN_ANSI_HIGH
                    .iter()
                    .find(|(c, _, _)| *c == code)
                    .map(|(_, _, ch)| *ch),
                0xA0 => Some(' '),
                0xAD => Some('-'),
                0xA1..=0xFF => char::from_u32(code as u32),
                _ => None,
            },
            BaseEncoding::MacRomanEncoding => match code {
                0x20..=0x7E => Some(code as char),
                0x80..=0xFF => Some(MAC_ROMAN_HIGH[(code - 0x80) as usize]),
                _ => None,
            },
        }
    }

    /// Full table of the encoding
    pub fn table(&self) -> [Option<char>; 256] {
        let mut table = [None; 256];
        for (code, slot) in table.iter_mut().enumerate() {
            *slot = self.decode(code as u8);
        }
        table
    }
}

fn glyph_char(name: &str) -> Option<char> {
    if let Some(i) = ASCII_NAMES.iter().position(|n| *n == name) {
        return char::from_u32(0x20 + i as u32);
    }
    if let Some(i) = LATIN1_NAMES.iter().position(|n| *n == name) {
        return char::from_u32(0xA0 + i as u32);
    }
    if let Some((_, _, ch)) = WIN_ANSI_HIGH.iter().find(|(_, n, _)| *n == name) {
        return Some(*ch);
    }
    OTHER_GLYPHS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, ch)| *ch)
}

fn hex_chars(hex: &str) -> Option<String> {
    if hex.is_empty() || hex.len() % 4 != 0 {
        return None;
    }
    let units = (0..hex.len())
        .step_by(4)
        .map(|i| u16::from_str_radix(&hex[i..i + 4], 16).ok())
        .collect::<Option<Vec<u16>>>()?;
    String::from_utf16(&units).ok()
}

/// Unicode text for an Adobe glyph name.
///
/// Handles the names of the standard Latin character sets, `uniXXXX`
/// sequences, `uXXXX[XX]`, suffixed variants (`a.sc`) and ligature
/// names joined by underscores (`f_f_i`).
pub fn glyph_to_unicode(name: &str) -> Option<String> {
    let base = name.split('.').next().unwrap_or(name);
    if base.is_empty() {
        return None;
    }
    if base.contains('_') {
        let parts = base
            .split('_')
            .map(glyph_to_unicode)
            .collect::<Option<Vec<String>>>()?;
        return Some(parts.concat());
    }
    if let Some(ch) = glyph_char(base) {
        return Some(ch.to_string());
    }
    if let Some(hex) = base.strip_prefix("uni") {
        if hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return hex_chars(hex);
        }
    }
    if let Some(hex) = base.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_ansi() {
        let enc = BaseEncoding::WinAnsiEncoding;
        assert_eq!(enc.decode(b'A'), Some('A'));
        assert_eq!(enc.decode(0x80), Some('€'));
        assert_eq!(enc.decode(0x93), Some('“'));
        assert_eq!(enc.decode(0xE9), Some('é'));
        assert_eq!(enc.decode(0x05), None);
    }

    #[test]
    fn test_standard_and_mac_roman() {
        assert_eq!(BaseEncoding::StandardEncoding.decode(0x27), Some('’'));
        assert_eq!(BaseEncoding::StandardEncoding.decode(0xAE), Some('ﬁ'));
        assert_eq!(BaseEncoding::StandardEncoding.decode(0xFB), Some('ß'));
        assert_eq!(BaseEncoding::MacRomanEncoding.decode(0x8E), Some('é'));
        assert_eq!(BaseEncoding::MacRomanEncoding.decode(0xD0), Some('–'));
    }

    #[test]
    fn test_glyph_names() {
        assert_eq!(glyph_to_unicode("A").as_deref(), Some("A"));
        assert_eq!(glyph_to_unicode("eacute").as_deref(), Some("é"));
        assert_eq!(glyph_to_unicode("quotedblright").as_deref(), Some("”"));
        assert_eq!(glyph_to_unicode("uni0041").as_deref(), Some("A"));
        assert_eq!(glyph_to_unicode("uni00410042").as_deref(), Some("AB"));
        assert_eq!(glyph_to_unicode("u1F600").as_deref(), Some("😀"));
        assert_eq!(glyph_to_unicode("a.sc").as_deref(), Some("a"));
        assert_eq!(glyph_to_unicode("f_i").as_deref(), Some("fi"));
        assert_eq!(glyph_to_unicode("g123"), None);
        assert_eq!(glyph_to_unicode(""), None);
    }
}

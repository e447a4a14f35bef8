//! Built-in widths for the standard 14 fonts.
//!
//! Widths cover the printable ASCII range in glyph space units
//! (1/1000 em). Other codes use the family default.

/// Helvetica, 0x20..=0x7E
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 222, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    222, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold, 0x20..=0x7E
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 278, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    278, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Times-Roman, 0x20..=0x7E
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 333, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Courier,
    Helvetica,
    HelveticaBold,
    Times,
}

/// Metrics of a standard font, looked up by base font name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardMetrics {
    family: Family,
}

impl StandardMetrics {
    /// Pick metrics for a base font name. Subset prefixes (`ABCDEF+`)
    /// are ignored; unknown fonts fall back to Helvetica.
    pub fn for_font(basefont: &str) -> Self {
        let name = basefont
            .split_once('+')
            .map(|(_, rest)| rest)
            .unwrap_or(basefont);
        let family = if name.starts_with("Courier") {
            Family::Courier
        } else if name.starts_with("Times") {
            Family::Times
        } else if name.starts_with("Helvetica") && name.contains("Bold") {
            Family::HelveticaBold
        } else {
            Family::Helvetica
        };
        Self { family }
    }

    /// Whether `basefont` names one of the standard 14 fonts
    pub fn is_standard(basefont: &str) -> bool {
        matches!(
            basefont,
            "Courier"
                | "Courier-Bold"
                | "Courier-Oblique"
                | "Courier-BoldOblique"
                | "Helvetica"
                | "Helvetica-Bold"
                | "Helvetica-Oblique"
                | "Helvetica-BoldOblique"
                | "Times-Roman"
                | "Times-Bold"
                | "Times-Italic"
                | "Times-BoldItalic"
                | "Symbol"
                | "ZapfDingbats"
        )
    }

    /// Width of a single-byte code in glyph space units
    pub fn width(&self, code: u8) -> f64 {
        let table = match self.family {
            Family::Courier => return 600.0,
            Family::Helvetica => &HELVETICA,
            Family::HelveticaBold => &HELVETICA_BOLD,
            Family::Times => &TIMES_ROMAN,
        };
        match code {
            0x20..=0x7E => table[(code - 0x20) as usize] as f64,
            _ => self.default_width(),
        }
    }

    pub fn default_width(&self) -> f64 {
        match self.family {
            Family::Courier => 600.0,
            Family::Helvetica | Family::HelveticaBold => 556.0,
            Family::Times => 500.0,
        }
    }
}

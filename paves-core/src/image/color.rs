//! Colours for boxes and highlights

use crate::error::{PavesError, Result};
use image::Rgb;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A colour given by CSS name or RGB components
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    Named(String),
    Rgb(u8, u8, u8),
    /// Components in `0.0..=1.0`
    RgbF(f64, f64, f64),
}

/// Default cycle, the same as matplotlib's
pub const DEFAULT_COLOR_CYCLE: [&str; 10] = [
    "blue", "orange", "green", "red", "purple", "brown", "pink", "gray", "olive", "cyan",
];

// CSS colour keywords, plus the matplotlib cycle names that differ
const NAMED: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("aqua", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("fuchsia", [255, 0, 255]),
    ("orange", [255, 165, 0]),
    ("purple", [128, 0, 128]),
    ("brown", [165, 42, 42]),
    ("pink", [255, 192, 203]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("lightgray", [211, 211, 211]),
    ("darkgray", [169, 169, 169]),
    ("silver", [192, 192, 192]),
    ("olive", [128, 128, 0]),
    ("navy", [0, 0, 128]),
    ("teal", [0, 128, 128]),
    ("maroon", [128, 0, 0]),
    ("gold", [255, 215, 0]),
    ("violet", [238, 130, 238]),
    ("indigo", [75, 0, 130]),
    ("salmon", [250, 128, 114]),
    ("coral", [255, 127, 80]),
    ("tomato", [255, 99, 71]),
    ("khaki", [240, 230, 140]),
    ("turquoise", [64, 224, 208]),
    ("skyblue", [135, 206, 235]),
    ("steelblue", [70, 130, 180]),
    ("darkgreen", [0, 100, 0]),
    ("darkred", [139, 0, 0]),
    ("darkblue", [0, 0, 139]),
    ("darkorange", [255, 140, 0]),
];

impl Color {
    pub fn named(name: impl Into<String>) -> Self {
        Color::Named(name.into())
    }

    /// Resolve to 8-bit RGB.
    pub fn to_rgb(&self) -> Result<Rgb<u8>> {
        match self {
            Color::Rgb(r, g, b) => Ok(Rgb([*r, *g, *b])),
            Color::RgbF(r, g, b) => {
                let to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0) as u8;
                Ok(Rgb([to_u8(*r), to_u8(*g), to_u8(*b)]))
            }
            Color::Named(name) => parse_hex(name)
                .or_else(|| {
                    let lower = name.to_ascii_lowercase();
                    NAMED
                        .iter()
                        .find(|(n, _)| *n == lower)
                        .map(|(_, rgb)| Rgb(*rgb))
                })
                .ok_or_else(|| PavesError::InvalidArgument(format!("Unknown color {:?}", name))),
        }
    }
}

fn parse_hex(s: &str) -> Option<Rgb<u8>> {
    let hex = s.strip_prefix('#')?;
    let digits: Vec<u8> = match hex.len() {
        3 => hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| (d * 17) as u8))
            .collect::<Option<_>>()?,
        6 => (0..3)
            .map(|i| u8::from_str_radix(hex.get(i * 2..i * 2 + 2)?, 16).ok())
            .collect::<Option<_>>()?,
        _ => return None,
    };
    Some(Rgb([digits[0], digits[1], digits[2]]))
}

impl FromStr for Color {
    type Err = PavesError;

    fn from_str(s: &str) -> Result<Self> {
        let color = Color::Named(s.to_string());
        color.to_rgb()?;
        Ok(color)
    }
}

impl From<&str> for Color {
    fn from(name: &str) -> Self {
        Color::Named(name.to_string())
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Color::Rgb(r, g, b)
    }
}

impl From<(f64, f64, f64)> for Color {
    fn from((r, g, b): (f64, f64, f64)) -> Self {
        Color::RgbF(r, g, b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Named(name) => write!(f, "{}", name),
            Color::Rgb(r, g, b) => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
            Color::RgbF(r, g, b) => write!(f, "({}, {}, {})", r, g, b),
        }
    }
}

/// How labels are mapped to colours
#[derive(Debug, Clone, PartialEq)]
pub enum Colors {
    /// Everything gets the same colour
    Single(Color),
    /// Each new label takes the next colour, wrapping around
    Cycle(Vec<Color>),
    /// Fixed colours per label, with a fallback
    Map {
        colors: HashMap<String, Color>,
        default: Color,
    },
}

impl Default for Colors {
    fn default() -> Self {
        Colors::Cycle(DEFAULT_COLOR_CYCLE.iter().map(|&c| Color::from(c)).collect())
    }
}

impl From<Color> for Colors {
    fn from(color: Color) -> Self {
        Colors::Single(color)
    }
}

/// Assigns colours to labels according to [`Colors`]
///
/// With a cycle, a label keeps the colour it got on first use.
#[derive(Debug, Clone)]
pub struct ColorMaker {
    colors: Colors,
    assigned: HashMap<String, Rgb<u8>>,
    next: usize,
}

impl ColorMaker {
    pub fn new(colors: Colors) -> Result<Self> {
        // unknown names fail here rather than halfway through drawing
        match &colors {
            Colors::Single(color) => {
                color.to_rgb()?;
            }
            Colors::Cycle(cycle) => {
                if cycle.is_empty() {
                    return Err(PavesError::InvalidArgument(
                        "Color cycle is empty".to_string(),
                    ));
                }
                for color in cycle {
                    color.to_rgb()?;
                }
            }
            Colors::Map { colors, default } => {
                default.to_rgb()?;
                for color in colors.values() {
                    color.to_rgb()?;
                }
            }
        }
        Ok(Self {
            colors,
            assigned: HashMap::new(),
            next: 0,
        })
    }

    pub fn color(&mut self, label: &str) -> Rgb<u8> {
        const FALLBACK: Rgb<u8> = Rgb([255, 0, 0]);
        match &self.colors {
            Colors::Single(color) => color.to_rgb().unwrap_or(FALLBACK),
            Colors::Map { colors, default } => colors
                .get(label)
                .unwrap_or(default)
                .to_rgb()
                .unwrap_or(FALLBACK),
            Colors::Cycle(cycle) => {
                if let Some(rgb) = self.assigned.get(label) {
                    return *rgb;
                }
                let rgb = cycle[self.next % cycle.len()].to_rgb().unwrap_or(FALLBACK);
                self.next += 1;
                self.assigned.insert(label.to_string(), rgb);
                rgb
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_forms() {
        assert_eq!(Color::from("blue").to_rgb().unwrap(), Rgb([0, 0, 255]));
        assert_eq!(Color::from("Red").to_rgb().unwrap(), Rgb([255, 0, 0]));
        assert_eq!(Color::from("#0f0").to_rgb().unwrap(), Rgb([0, 255, 0]));
        assert_eq!(Color::from("#102030").to_rgb().unwrap(), Rgb([16, 32, 48]));
        assert_eq!(Color::from((1.0, 0.5, 0.0)).to_rgb().unwrap(), Rgb([255, 127, 0]));
        assert!(Color::from("octarine").to_rgb().is_err());
        assert!("nope".parse::<Color>().is_err());
    }

    #[test]
    fn test_cycle_assigns_on_first_use() {
        let mut maker = ColorMaker::new(Colors::default()).unwrap();
        let word = maker.color("word");
        let line = maker.color("line");
        assert_eq!(word, Rgb([0, 0, 255]));
        assert_eq!(line, Rgb([255, 165, 0]));
        assert_eq!(maker.color("word"), word);
    }

    #[test]
    fn test_cycle_wraps() {
        let cycle = Colors::Cycle(vec!["red".into(), "blue".into()]);
        let mut maker = ColorMaker::new(cycle).unwrap();
        let colors: Vec<Rgb<u8>> = ["a", "b", "c"].iter().map(|l| maker.color(l)).collect();
        assert_eq!(colors[0], colors[2]);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn test_map_with_default() {
        let colors = Colors::Map {
            colors: HashMap::from([("Table".to_string(), Color::from("green"))]),
            default: "red".into(),
        };
        let mut maker = ColorMaker::new(colors).unwrap();
        assert_eq!(maker.color("Table"), Rgb([0, 128, 0]));
        assert_eq!(maker.color("P"), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_invalid_colors_fail_early() {
        assert!(ColorMaker::new(Colors::Single("nope".into())).is_err());
        assert!(ColorMaker::new(Colors::Cycle(Vec::new())).is_err());
    }
}

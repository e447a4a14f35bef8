//! Graphics, text and marked content state

use super::parser::Operand;
use crate::font::Font;
use crate::geometry::Matrix;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A color space and its number of components
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorSpace {
    pub name: String,
    pub ncomponents: usize,
}

impl ColorSpace {
    pub fn new(name: impl Into<String>, ncomponents: usize) -> Self {
        Self {
            name: name.into(),
            ncomponents,
        }
    }

    /// Device and abbreviated color spaces, by name
    pub fn predefined(name: &str) -> Option<Self> {
        match name {
            "DeviceGray" | "G" | "CalGray" => Some(Self::new("DeviceGray", 1)),
            "DeviceRGB" | "RGB" | "CalRGB" => Some(Self::new("DeviceRGB", 3)),
            "DeviceCMYK" | "CMYK" => Some(Self::new("DeviceCMYK", 4)),
            "Pattern" => Some(Self::new("Pattern", 1)),
            "Indexed" | "I" => Some(Self::new("Indexed", 1)),
            "Lab" => Some(Self::new("Lab", 3)),
            _ => None,
        }
    }
}

impl Default for ColorSpace {
    fn default() -> Self {
        Self::new("DeviceGray", 1)
    }
}

/// A color value, possibly naming a pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Color {
    pub values: Vec<f64>,
    pub pattern: Option<String>,
}

impl Color {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            pattern: None,
        }
    }

    /// Initial color of a color space (black for device spaces)
    pub fn initial(space: &ColorSpace) -> Self {
        match space.name.as_str() {
            "DeviceCMYK" => Self::new(vec![0.0, 0.0, 0.0, 1.0]),
            _ => Self::new(vec![0.0; space.ncomponents.max(1)]),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(vec![0.0])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashPattern {
    pub dash: Vec<f64>,
    pub phase: f64,
}

/// Graphics state parameters that objects carry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphicState {
    pub linewidth: f64,
    pub linecap: i64,
    pub linejoin: i64,
    pub miterlimit: f64,
    pub dash: DashPattern,
    pub intent: Option<String>,
    pub flatness: f64,
    /// Stroking color and color space
    pub scolor: Color,
    pub scs: ColorSpace,
    /// Non-stroking color and color space
    pub ncolor: Color,
    pub ncs: ColorSpace,
    pub stroke_alpha: f64,
    pub fill_alpha: f64,
}

impl Default for GraphicState {
    fn default() -> Self {
        Self {
            linewidth: 1.0,
            linecap: 0,
            linejoin: 0,
            miterlimit: 10.0,
            dash: DashPattern::default(),
            intent: None,
            flatness: 1.0,
            scolor: Color::default(),
            scs: ColorSpace::default(),
            ncolor: Color::default(),
            ncs: ColorSpace::default(),
            stroke_alpha: 1.0,
            fill_alpha: 1.0,
        }
    }
}

/// Text state, reset at each `BT` for the matrices only
#[derive(Debug, Clone)]
pub struct TextState {
    pub font: Option<Arc<Font>>,
    pub fontsize: f64,
    pub charspace: f64,
    pub wordspace: f64,
    /// Horizontal scaling in percent
    pub scaling: f64,
    pub leading: f64,
    pub render_mode: i64,
    pub rise: f64,
    /// Text matrix (Tm)
    pub matrix: Matrix,
    /// Text line matrix (Tlm)
    pub line_matrix: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            fontsize: 0.0,
            charspace: 0.0,
            wordspace: 0.0,
            scaling: 100.0,
            leading: 0.0,
            render_mode: 0,
            rise: 0.0,
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
        }
    }
}

impl TextState {
    pub fn reset_matrices(&mut self) {
        self.matrix = Matrix::IDENTITY;
        self.line_matrix = Matrix::IDENTITY;
    }

    /// Move to the start of the next line, offset by `(tx, ty)`
    pub fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = self.line_matrix.translate(tx, ty);
        self.matrix = self.line_matrix;
    }
}

/// An entry of the marked content stack
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedContent {
    pub tag: String,
    pub mcid: Option<i64>,
    pub props: BTreeMap<String, Operand>,
}

impl MarkedContent {
    pub fn new(tag: impl Into<String>, props: BTreeMap<String, Operand>) -> Self {
        let mcid = match props.get("MCID") {
            Some(Operand::Integer(mcid)) => Some(*mcid),
            _ => None,
        };
        Self {
            tag: tag.into(),
            mcid,
            props,
        }
    }
}

impl fmt::Display for MarkedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mcid {
            Some(mcid) => write!(f, "{} (MCID {mcid})", self.tag),
            None => write!(f, "{}", self.tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marked_content_mcid() {
        let mut props = BTreeMap::new();
        props.insert("MCID".to_string(), Operand::Integer(4));
        let mc = MarkedContent::new("P", props);
        assert_eq!(mc.mcid, Some(4));
        assert_eq!(mc.to_string(), "P (MCID 4)");
        assert_eq!(MarkedContent::new("Artifact", BTreeMap::new()).mcid, None);
    }

    #[test]
    fn test_initial_colors() {
        let cmyk = ColorSpace::predefined("DeviceCMYK").unwrap();
        assert_eq!(Color::initial(&cmyk).values, vec![0.0, 0.0, 0.0, 1.0]);
        let rgb = ColorSpace::predefined("RGB").unwrap();
        assert_eq!(Color::initial(&rgb).values, vec![0.0, 0.0, 0.0]);
        assert!(ColorSpace::predefined("Separation").is_none());
    }

    #[test]
    fn test_text_line_movement() {
        let mut ts = TextState::default();
        ts.move_line(10.0, 700.0);
        ts.matrix = ts.matrix.translate(25.0, 0.0);
        ts.move_line(0.0, -14.0);
        assert_eq!(ts.matrix, Matrix::translation(10.0, 686.0));
    }
}

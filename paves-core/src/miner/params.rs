//! Layout analysis parameters

use crate::error::{PavesError, Result};

/// Parameters for layout analysis
///
/// Margins are relative: `char_margin` and `word_margin` to the size of
/// a character, `line_margin` to the height of a line, `line_overlap`
/// to the smaller of two characters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LAParams {
    /// Minimum relative overlap for two characters to share a line
    pub line_overlap: f64,
    /// Maximum relative distance between characters of a line
    pub char_margin: f64,
    /// Maximum relative distance between lines of a box
    pub line_margin: f64,
    /// Relative gap that inserts a space between characters
    pub word_margin: f64,
    /// Weight of horizontal (-1) versus vertical (+1) position when
    /// ordering text boxes; `None` orders boxes by their corners only.
    pub boxes_flow: Option<f64>,
    pub detect_vertical: bool,
    /// Also analyze text inside figures
    pub all_texts: bool,
}

impl Default for LAParams {
    fn default() -> Self {
        Self {
            line_overlap: 0.5,
            char_margin: 2.0,
            line_margin: 0.5,
            word_margin: 0.1,
            boxes_flow: Some(0.5),
            detect_vertical: false,
            all_texts: false,
        }
    }
}

impl LAParams {
    pub fn validate(&self) -> Result<()> {
        match self.boxes_flow {
            Some(flow) if !(-1.0..=1.0).contains(&flow) => Err(PavesError::InvalidArgument(
                format!("boxes_flow should be None, or a number between -1 and +1, got {flow}"),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = LAParams::default();
        assert_eq!(params.boxes_flow, Some(0.5));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_boxes_flow_range() {
        let mut params = LAParams {
            boxes_flow: Some(-1.0),
            ..Default::default()
        };
        assert!(params.validate().is_ok());
        params.boxes_flow = None;
        assert!(params.validate().is_ok());
        params.boxes_flow = Some(1.5);
        assert!(matches!(
            params.validate(),
            Err(PavesError::InvalidArgument(_))
        ));
    }
}

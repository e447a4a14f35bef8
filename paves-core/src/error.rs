use thiserror::Error;

use crate::content::ParseError;

#[derive(Error, Debug)]
pub enum PavesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Content stream error: {0}")]
    Content(#[from] ParseError),

    #[error("Invalid PDF structure: {0}")]
    InvalidStructure(String),

    #[error("Invalid page index: {0}")]
    InvalidPage(usize),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Font error: {0}")]
    FontError(String),

    #[error("Not installed: {0}")]
    NotInstalled(String),

    #[error("Renderer {renderer} failed: {message}")]
    RenderFailed { renderer: String, message: String },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PavesError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_error_display() {
        let error = PavesError::InvalidStructure("no page tree".to_string());
        assert_eq!(error.to_string(), "Invalid PDF structure: no page tree");

        let error = PavesError::InvalidPage(42);
        assert_eq!(error.to_string(), "Invalid page index: 42");

        let error = PavesError::RenderFailed {
            renderer: "pdftoppm".to_string(),
            message: "exit status 1".to_string(),
        };
        assert_eq!(error.to_string(), "Renderer pdftoppm failed: exit status 1");
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = IoError::new(ErrorKind::NotFound, "file not found");
        let error = PavesError::from(io_error);

        match error {
            PavesError::Io(ref err) => assert_eq!(err.kind(), ErrorKind::NotFound),
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_error_from_parse_error() {
        let parse_error = ParseError::SyntaxError {
            position: 12,
            message: "Unterminated hex string".to_string(),
        };
        let error = PavesError::from(parse_error);
        assert!(error.to_string().contains("position 12"));
    }

    #[test]
    fn test_not_installed_message() {
        let error = PavesError::NotInstalled("Poppler does not seem to be installed".into());
        assert_eq!(
            error.to_string(),
            "Not installed: Poppler does not seem to be installed"
        );
    }
}

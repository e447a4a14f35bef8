//! Rendering with Poppler's `pdftoppm`

use super::{
    collect_pages, page_sizes, page_spans, pdf_file, run, Converter, RenderOptions, RenderedPage,
};
use crate::document::PdfSource;
use crate::error::Result;
use std::process::Command;

const PROGRAM: &str = "pdftoppm";
const PREFIX: &str = "ppm";

#[derive(Debug, Clone, Copy, Default)]
pub struct Poppler;

/// Scaling arguments; -1 keeps the aspect ratio
pub(crate) fn poppler_args(options: &RenderOptions) -> Vec<String> {
    if options.has_size() {
        vec![
            "-scale-to-x".to_string(),
            options.width.map_or(-1, i64::from).to_string(),
            "-scale-to-y".to_string(),
            options.height.map_or(-1, i64::from).to_string(),
        ]
    } else {
        vec!["-r".to_string(), options.resolution().to_string()]
    }
}

impl Converter for Poppler {
    fn name(&self) -> &'static str {
        "poppler"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn convert(
        &self,
        source: &PdfSource<'_>,
        options: &RenderOptions,
    ) -> Result<Vec<RenderedPage>> {
        options.validate()?;
        let sizes = page_sizes(source)?;
        let dir = tempfile::tempdir()?;
        let pdf = pdf_file(source, dir.path())?;
        let args = poppler_args(options);
        let output = dir.path().join(PREFIX);

        let spans = match source {
            PdfSource::Path(_) | PdfSource::Document(_) => vec![None],
            _ => {
                let indices: Vec<usize> = sizes.iter().map(|s| s.index).collect();
                page_spans(&indices).into_iter().map(Some).collect()
            }
        };
        for span in spans {
            let mut command = Command::new(PROGRAM);
            command.arg("-png").args(&args);
            if let Some((first, last)) = span {
                command
                    .arg("-f")
                    .arg(first.to_string())
                    .arg("-l")
                    .arg(last.to_string());
            }
            command.arg(&pdf).arg(&output);
            run(PROGRAM, command, "Poppler")?;
        }
        collect_pages(PROGRAM, dir.path(), PREFIX, &sizes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_args() {
        assert_eq!(poppler_args(&RenderOptions::default()), vec!["-r", "72"]);
        assert_eq!(poppler_args(&RenderOptions::dpi(150)), vec!["-r", "150"]);
    }

    #[test]
    fn test_size_args_keep_aspect_ratio() {
        assert_eq!(
            poppler_args(&RenderOptions::size(Some(800), None)),
            vec!["-scale-to-x", "800", "-scale-to-y", "-1"]
        );
        assert_eq!(
            poppler_args(&RenderOptions::size(None, Some(600))),
            vec!["-scale-to-x", "-1", "-scale-to-y", "600"]
        );
    }
}

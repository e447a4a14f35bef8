//! Rendering with MuPDF's `mutool draw`

use super::{
    collect_pages, page_sizes, page_spans, pdf_file, run, Converter, PageSize, RenderOptions,
    RenderedPage, DEFAULT_DPI,
};
use crate::document::PdfSource;
use crate::error::Result;
use image::imageops::{self, FilterType};
use std::path::Path;
use std::process::Command;

const PROGRAM: &str = "mutool";
const PREFIX: &str = "page";

#[derive(Debug, Clone, Copy, Default)]
pub struct MuPdf;

/// Page ranges in `mutool` syntax, e.g. `1-3,6`
pub(crate) fn page_ranges(sizes: &[PageSize]) -> String {
    let indices: Vec<usize> = sizes.iter().map(|s| s.index).collect();
    page_spans(&indices)
        .into_iter()
        .map(|(first, last)| {
            if first == last {
                first.to_string()
            } else {
                format!("{}-{}", first, last)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Resolution that covers both requested dimensions of a page
pub(crate) fn covering_dpi(size: &PageSize, width: u32, height: u32) -> u32 {
    let scale = (f64::from(width) / size.width).max(f64::from(height) / size.height);
    (scale * f64::from(DEFAULT_DPI)).ceil().max(1.0) as u32
}

fn draw(pdf: &Path, dir: &Path, args: &[String], pages: &str) -> Result<()> {
    let mut command = Command::new(PROGRAM);
    command
        .arg("draw")
        .arg("-q")
        .arg("-F")
        .arg("png")
        .arg("-o")
        .arg(dir.join(format!("{}-%d.png", PREFIX)))
        .args(args)
        .arg(pdf)
        .arg(pages);
    run(PROGRAM, command, "MuPDF")
}

impl Converter for MuPdf {
    fn name(&self) -> &'static str {
        "mupdf"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn convert(
        &self,
        source: &PdfSource<'_>,
        options: &RenderOptions,
    ) -> Result<Vec<RenderedPage>> {
        options.validate()?;
        let sizes = page_sizes(source)?;
        if sizes.is_empty() {
            return Ok(Vec::new());
        }
        let dir = tempfile::tempdir()?;
        let pdf = pdf_file(source, dir.path())?;
        let out = dir.path().join("out");
        std::fs::create_dir(&out)?;

        match (options.width, options.height) {
            (Some(width), Some(height)) => {
                // render each page large enough, then squash to the exact size
                for size in &sizes {
                    let args = vec!["-r".to_string(), covering_dpi(size, width, height).to_string()];
                    draw(&pdf, &out, &args, &(size.index + 1).to_string())?;
                }
                let mut pages = collect_pages(PROGRAM, &out, PREFIX, &sizes)?;
                for page in &mut pages {
                    page.image = imageops::resize(&page.image, width, height, FilterType::Triangle);
                }
                Ok(pages)
            }
            (Some(width), None) => {
                draw(&pdf, &out, &["-w".to_string(), width.to_string()], &page_ranges(&sizes))?;
                collect_pages(PROGRAM, &out, PREFIX, &sizes)
            }
            (None, Some(height)) => {
                draw(&pdf, &out, &["-h".to_string(), height.to_string()], &page_ranges(&sizes))?;
                collect_pages(PROGRAM, &out, PREFIX, &sizes)
            }
            (None, None) => {
                let args = vec!["-r".to_string(), options.resolution().to_string()];
                draw(&pdf, &out, &args, &page_ranges(&sizes))?;
                collect_pages(PROGRAM, &out, PREFIX, &sizes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(index: usize, width: f64, height: f64) -> PageSize {
        PageSize {
            index,
            width,
            height,
        }
    }

    #[test]
    fn test_page_ranges() {
        let sizes = [size(0, 1.0, 1.0), size(1, 1.0, 1.0), size(4, 1.0, 1.0)];
        assert_eq!(page_ranges(&sizes), "1-2,5");
    }

    #[test]
    fn test_covering_dpi_uses_the_larger_scale() {
        let letter = size(0, 612.0, 792.0);
        // 1224 px wide is 2x, 792 px high is 1x
        assert_eq!(covering_dpi(&letter, 1224, 792), 144);
        assert_eq!(covering_dpi(&letter, 612, 1584), 144);
    }
}

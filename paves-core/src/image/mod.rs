//! Page images
//!
//! Rendering is delegated to external programs ([`Poppler`]'s `pdftoppm`
//! or [`MuPdf`]'s `mutool`), tried in priority order by [`convert`].
//! The [`draw`] module puts boxes and highlights on top of the results.

pub mod color;
pub mod draw;
mod font5x7;
pub mod mupdf;
pub mod poppler;

pub use color::{Color, ColorMaker, Colors, DEFAULT_COLOR_CYCLE};
pub use draw::{draw_boxes, mark, BoxOptions, Boxable, MarkOptions};
pub use mupdf::MuPdf;
pub use poppler::Poppler;

use crate::document::{Page, PdfSource};
use crate::error::{PavesError, Result};
use image::RgbImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Resolution used when nothing else is requested
pub const DEFAULT_DPI: u32 = 72;

/// Output size of rendered pages
///
/// Either a resolution or a target size in pixels can be given, not
/// both. A single dimension keeps the aspect ratio of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub dpi: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl RenderOptions {
    pub fn dpi(dpi: u32) -> Self {
        Self {
            dpi: Some(dpi),
            ..Self::default()
        }
    }

    pub fn size(width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            dpi: None,
            width,
            height,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dpi.is_some() && (self.width.is_some() || self.height.is_some()) {
            return Err(PavesError::InvalidArgument(
                "Cannot specify both dpi and width or height".to_string(),
            ));
        }
        if [self.dpi, self.width, self.height].contains(&Some(0)) {
            return Err(PavesError::InvalidArgument(
                "Resolution and sizes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolution to render at when no size is requested
    pub fn resolution(&self) -> u32 {
        self.dpi.unwrap_or(DEFAULT_DPI)
    }

    pub fn has_size(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }
}

/// One rendered page, with the size of the page in default user space
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub image: RgbImage,
    pub page_index: usize,
    pub page_width: f64,
    pub page_height: f64,
}

/// Something that turns PDF pages into images
pub trait Converter {
    fn name(&self) -> &'static str;

    /// Lower runs first
    fn priority(&self) -> i32;

    /// Render the pages of `source`, in the order they are selected.
    ///
    /// Fails with [`PavesError::NotInstalled`] when the renderer is
    /// missing, so that the next converter can be tried.
    fn convert(&self, source: &PdfSource<'_>, options: &RenderOptions)
        -> Result<Vec<RenderedPage>>;
}

/// Built-in converters, by priority
pub fn converters() -> Vec<Box<dyn Converter>> {
    let mut converters: Vec<Box<dyn Converter>> = vec![Box::new(Poppler), Box::new(MuPdf)];
    converters.sort_by_key(|c| c.priority());
    converters
}

/// Render with the first available converter.
pub fn convert<'a>(
    source: impl Into<PdfSource<'a>>,
    options: &RenderOptions,
) -> Result<Vec<RenderedPage>> {
    convert_with(&converters(), &source.into(), options)
}

/// Render with the first of `converters` that is installed.
pub fn convert_with(
    converters: &[Box<dyn Converter>],
    source: &PdfSource<'_>,
    options: &RenderOptions,
) -> Result<Vec<RenderedPage>> {
    options.validate()?;
    let mut ordered: Vec<&dyn Converter> = converters.iter().map(|c| c.as_ref()).collect();
    ordered.sort_by_key(|c| c.priority());
    for converter in &ordered {
        match converter.convert(source, options) {
            Ok(pages) => {
                info!("Rendered {} pages with {}", pages.len(), converter.name());
                return Ok(pages);
            }
            Err(PavesError::NotInstalled(reason)) => {
                debug!("Skipping converter {}: {}", converter.name(), reason);
            }
            Err(e) => return Err(e),
        }
    }
    let tried: Vec<&str> = ordered.iter().map(|c| c.name()).collect();
    Err(PavesError::NotInstalled(format!(
        "No converters available, tried: {}",
        tried.join(", ")
    )))
}

/// Render a single page.
pub fn show(page: Page<'_>, dpi: u32) -> Result<RgbImage> {
    convert(page, &RenderOptions::dpi(dpi))?
        .into_iter()
        .next()
        .map(|rendered| rendered.image)
        .ok_or_else(|| PavesError::RenderFailed {
            renderer: "convert".to_string(),
            message: format!("no image for page {}", page.index()),
        })
}

/// Size of one selected page, in default user space units
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageSize {
    pub index: usize,
    pub width: f64,
    pub height: f64,
}

pub(crate) fn page_sizes(source: &PdfSource<'_>) -> Result<Vec<PageSize>> {
    source.with_pages(|page| {
        Ok(PageSize {
            index: page.index(),
            width: page.width(),
            height: page.height(),
        })
    })
}

/// Contiguous runs of 1-based page numbers, for `-f`/`-l` style ranges
pub(crate) fn page_spans(indices: &[usize]) -> Vec<(usize, usize)> {
    let mut numbers: Vec<usize> = indices.iter().map(|i| i + 1).collect();
    numbers.sort_unstable();
    numbers.dedup();
    let mut spans: Vec<(usize, usize)> = Vec::new();
    for number in numbers {
        match spans.last_mut() {
            Some((_, last)) if number == *last + 1 => *last = number,
            _ => spans.push((number, number)),
        }
    }
    spans
}

/// A PDF file the renderers can read
///
/// Sources that are already on disk are used in place, the others are
/// written into `dir`.
pub(crate) fn pdf_file(source: &PdfSource<'_>, dir: &Path) -> Result<PathBuf> {
    let doc = match source {
        PdfSource::Path(path) => return Ok(path.clone()),
        PdfSource::Document(doc) => *doc,
        PdfSource::Page(page) => page.doc(),
        PdfSource::Pages(pages) => pages.doc(),
    };
    if let Some(path) = doc.path() {
        return Ok(path.to_path_buf());
    }
    let path = dir.join("pdf.pdf");
    std::fs::write(&path, doc.buffer())?;
    Ok(path)
}

/// Run a renderer, mapping a missing executable to `NotInstalled`.
pub(crate) fn run(program: &str, mut command: Command, product: &str) -> Result<()> {
    debug!("Running {:?}", command);
    let output = command.output().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            PavesError::NotInstalled(format!("{} does not seem to be installed", product))
        }
        _ => PavesError::Io(e),
    })?;
    if !output.status.success() {
        return Err(PavesError::RenderFailed {
            renderer: program.to_string(),
            message: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}

/// Load `<prefix>-<page number>.png` files written by a renderer and
/// pair them with the selected pages.
pub(crate) fn collect_pages(
    renderer: &str,
    dir: &Path,
    prefix: &str,
    sizes: &[PageSize],
) -> Result<Vec<RenderedPage>> {
    let mut files: HashMap<usize, PathBuf> = HashMap::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        let number = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_prefix(prefix))
            .and_then(|s| s.strip_prefix('-'))
            .and_then(|s| s.parse::<usize>().ok());
        if let Some(number) = number {
            files.insert(number, path);
        }
    }
    sizes
        .iter()
        .map(|size| {
            let path = files
                .get(&(size.index + 1))
                .ok_or_else(|| PavesError::RenderFailed {
                    renderer: renderer.to_string(),
                    message: format!("no output for page {}", size.index + 1),
                })?;
            Ok(RenderedPage {
                image: image::open(path)?.to_rgb8(),
                page_index: size.index,
                page_width: size.width,
                page_height: size.height,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Missing(&'static str, i32);

    impl Converter for Missing {
        fn name(&self) -> &'static str {
            self.0
        }

        fn priority(&self) -> i32 {
            self.1
        }

        fn convert(&self, _: &PdfSource<'_>, _: &RenderOptions) -> Result<Vec<RenderedPage>> {
            Err(PavesError::NotInstalled(format!("{} is missing", self.0)))
        }
    }

    struct Blank;

    impl Converter for Blank {
        fn name(&self) -> &'static str {
            "blank"
        }

        fn priority(&self) -> i32 {
            50
        }

        fn convert(&self, _: &PdfSource<'_>, options: &RenderOptions) -> Result<Vec<RenderedPage>> {
            let side = options.resolution();
            Ok(vec![RenderedPage {
                image: RgbImage::new(side, side),
                page_index: 0,
                page_width: 72.0,
                page_height: 72.0,
            }])
        }
    }

    fn source() -> PdfSource<'static> {
        PdfSource::Path(PathBuf::from("unused.pdf"))
    }

    #[test]
    fn test_options_validation() {
        assert!(RenderOptions::default().validate().is_ok());
        assert_eq!(RenderOptions::default().resolution(), 72);
        let both = RenderOptions {
            dpi: Some(100),
            width: Some(200),
            height: None,
        };
        assert!(matches!(both.validate(), Err(PavesError::InvalidArgument(_))));
        assert!(RenderOptions::size(Some(0), None).validate().is_err());
    }

    #[test]
    fn test_convert_falls_through_missing_converters() {
        let converters: Vec<Box<dyn Converter>> =
            vec![Box::new(Blank), Box::new(Missing("first", 1))];
        let pages = convert_with(&converters, &source(), &RenderOptions::dpi(10)).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].image.dimensions(), (10, 10));
    }

    #[test]
    fn test_convert_reports_every_missing_converter() {
        let converters: Vec<Box<dyn Converter>> =
            vec![Box::new(Missing("second", 20)), Box::new(Missing("first", 10))];
        let err = convert_with(&converters, &source(), &RenderOptions::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Not installed: No converters available, tried: first, second"
        );
    }

    #[test]
    fn test_invalid_options_are_rejected_before_rendering() {
        let converters: Vec<Box<dyn Converter>> = vec![Box::new(Blank)];
        let options = RenderOptions {
            dpi: Some(72),
            width: None,
            height: Some(100),
        };
        assert!(matches!(
            convert_with(&converters, &source(), &options),
            Err(PavesError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_page_spans() {
        assert_eq!(page_spans(&[0, 1, 2, 5, 7, 8]), vec![(1, 3), (6, 6), (8, 9)]);
        assert_eq!(page_spans(&[3, 2]), vec![(3, 4)]);
        assert!(page_spans(&[]).is_empty());
    }

    #[test]
    fn test_collect_pages_matches_page_numbers() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::new(4, 2).save(dir.path().join("ppm-03.png")).unwrap();
        RgbImage::new(2, 4).save(dir.path().join("ppm-10.png")).unwrap();
        std::fs::write(dir.path().join("pdf.pdf"), b"%PDF").unwrap();
        let sizes = [
            PageSize { index: 9, width: 10.0, height: 20.0 },
            PageSize { index: 2, width: 20.0, height: 10.0 },
        ];
        let pages = collect_pages("pdftoppm", dir.path(), "ppm", &sizes).unwrap();
        assert_eq!(pages[0].page_index, 9);
        assert_eq!(pages[0].image.dimensions(), (2, 4));
        assert_eq!(pages[1].page_width, 20.0);

        let missing = [PageSize { index: 0, width: 1.0, height: 1.0 }];
        assert!(matches!(
            collect_pages("pdftoppm", dir.path(), "ppm", &missing),
            Err(PavesError::RenderFailed { .. })
        ));
    }
}

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use paves::image::{self as render, draw_boxes, mark, BoxOptions, Boxable, MarkOptions, RenderOptions};
use paves::miner::{self, LAParams, LTItem};
use paves::tables::{self, Detector};
use paves::{bears, text, Document, PdfSource, Space};
use serde_json::json;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "paves",
    about = "PDF analysis and visualization",
    version,
    author
)]
struct Cli {
    /// Log debugging output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Pages and coordinate space shared by most commands
#[derive(clap::Args)]
struct Selection {
    /// Input PDF file
    input: PathBuf,

    /// Page numbers to process, starting at 1 (all pages if not given)
    #[arg(short, long = "page", value_name = "N")]
    pages: Vec<usize>,

    /// Coordinate space: screen, page or default
    #[arg(long, default_value = "screen")]
    space: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show document and page information
    Info {
        /// Input PDF file
        input: PathBuf,
    },

    /// List words with their bounding boxes
    Words {
        #[command(flatten)]
        selection: Selection,

        /// One JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// Show the pdfminer-style layout of pages
    Layout {
        #[command(flatten)]
        selection: Selection,

        /// Only list layout objects, without grouping text
        #[arg(long)]
        no_analysis: bool,

        /// Reading order weight of vertical position, or "none"
        #[arg(long, value_name = "FLOW")]
        boxes_flow: Option<String>,

        /// Also group vertical text
        #[arg(long)]
        detect_vertical: bool,

        /// Analyze text inside figures
        #[arg(long)]
        all_texts: bool,
    },

    /// Write one JSON record per glyph
    Extract {
        #[command(flatten)]
        selection: Selection,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Find tables
    Tables {
        #[command(flatten)]
        selection: Selection,

        /// Use only this detector (structure or lattice)
        #[arg(short, long)]
        detector: Option<String>,
    },

    /// Render pages to PNG images
    Render {
        #[command(flatten)]
        selection: Selection,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        #[command(flatten)]
        size: SizeArgs,
    },

    /// Draw boxes or highlights for objects of one page
    Boxes {
        /// Input PDF file
        input: PathBuf,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Objects to draw
        #[arg(long, value_enum, default_value_t = Objects::Words)]
        objects: Objects,

        /// Highlight instead of outlining
        #[arg(long)]
        highlight: bool,

        /// Do not label boxes
        #[arg(long)]
        no_labels: bool,

        /// Resolution of the page image
        #[arg(long, default_value_t = render::DEFAULT_DPI)]
        dpi: u32,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct SizeArgs {
    /// Resolution in dots per inch
    #[arg(long, conflicts_with_all = ["width", "height"])]
    dpi: Option<u32>,

    /// Width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Height in pixels
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Objects {
    Words,
    Texts,
    Glyphs,
    Paths,
    Images,
    Xobjects,
    Annotations,
    Tables,
    Textboxes,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "paves=debug" } else { "paves=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open(input: &Path, space: Space) -> Result<Document> {
    let doc = Document::open(input)
        .with_context(|| format!("Failed to open PDF: {}", input.display()))?;
    debug!("Opened {} with {} pages", input.display(), doc.page_count());
    Ok(doc.with_space(space))
}

/// Zero-based indices from page numbers
fn page_indices(doc: &Document, pages: &[usize]) -> Result<Vec<usize>> {
    pages
        .iter()
        .map(|&number| {
            if number == 0 || number > doc.page_count() {
                bail!("Page {} out of range 1-{}", number, doc.page_count());
            }
            Ok(number - 1)
        })
        .collect()
}

impl Selection {
    fn document(&self) -> Result<Document> {
        let space: Space = self.space.parse()?;
        open(&self.input, space)
    }

    fn source<'d>(&self, doc: &'d Document) -> Result<PdfSource<'d>> {
        if self.pages.is_empty() {
            return Ok(PdfSource::from(doc));
        }
        let indices = page_indices(doc, &self.pages)?;
        Ok(PdfSource::from(doc.pages().select(indices)?))
    }
}

fn parse_boxes_flow(value: Option<&str>) -> Result<Option<f64>> {
    match value {
        None => Ok(LAParams::default().boxes_flow),
        Some("none") => Ok(None),
        Some(flow) => Ok(Some(
            flow.parse()
                .with_context(|| format!("Invalid boxes flow {flow:?}"))?,
        )),
    }
}

fn print_item(out: &mut impl Write, item: &LTItem, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    writeln!(out, "{indent}{item}")?;
    match item {
        LTItem::TextBox(textbox) => {
            for line in &textbox.lines {
                writeln!(out, "{indent}  {line}")?;
            }
        }
        LTItem::Figure(figure) => {
            for child in &figure.items {
                print_item(out, child, depth + 1)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn info(input: &Path) -> Result<()> {
    let doc = open(input, Space::Page)?;
    println!("PDF Information for: {}", input.display());
    println!("PDF Version: {}", doc.inner().version);
    println!("Pages: {}", doc.page_count());
    let tagged = doc.structure()?;
    match &tagged {
        Some(tree) => println!("Tagged: yes ({} structure elements)", tree.len()),
        None => println!("Tagged: no"),
    }
    for page in doc.pages().iter() {
        println!(
            "Page {}: {:.0}x{:.0} pts, rotate {}",
            page.index() + 1,
            page.width(),
            page.height(),
            page.rotate()
        );
    }
    Ok(())
}

fn words(selection: &Selection, as_json: bool) -> Result<()> {
    let doc = selection.document()?;
    let mut out = BufWriter::new(io::stdout().lock());
    for word in text::words(selection.source(&doc)?)? {
        if as_json {
            let record = json!({
                "page_index": word.page_index,
                "text": word.text(),
                "bbox": word.bbox(),
                "mcid": word.mcid(),
            });
            writeln!(out, "{record}")?;
        } else {
            writeln!(out, "{} {} {}", word.page_index + 1, word.bbox(), word.text())?;
        }
    }
    out.flush()?;
    Ok(())
}

fn layout(selection: &Selection, laparams: Option<LAParams>) -> Result<()> {
    let doc = selection.document()?;
    let mut out = BufWriter::new(io::stdout().lock());
    for page in miner::extract(selection.source(&doc)?, laparams.as_ref())? {
        writeln!(out, "{page}")?;
        for item in &page {
            print_item(&mut out, item, 1)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn extract(selection: &Selection, output: Option<&Path>) -> Result<()> {
    let doc = selection.document()?;
    let records = bears::extract(selection.source(&doc)?)?;
    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for record in &records {
        serde_json::to_writer(&mut out, record)?;
        writeln!(out)?;
    }
    out.flush()?;
    if let Some(path) = output {
        info!("Wrote {} glyphs to {}", records.len(), path.display());
    }
    Ok(())
}

fn find_tables(selection: &Selection, detector: Option<&str>) -> Result<()> {
    let doc = selection.document()?;
    let source = selection.source(&doc)?;
    let found = match detector {
        Some(name) => {
            let Some(detector) = tables::lookup(name) else {
                bail!("Unknown detector {name:?}, expected structure or lattice");
            };
            match detector.detect(&source)? {
                Some(found) => found,
                None => bail!("Detector {name} does not apply to {}", selection.input.display()),
            }
        }
        None => tables::tables(source)?,
    };
    for table in found {
        let record = json!({
            "page_index": table.page_index,
            "bbox": table.bbox,
            "element_type": table.element.as_ref().map(|el| el.element_type.clone()),
        });
        println!("{record}");
    }
    Ok(())
}

fn render_pages(selection: &Selection, output: &Path, size: &SizeArgs) -> Result<()> {
    let doc = selection.document()?;
    let options = match size.dpi {
        Some(dpi) => RenderOptions::dpi(dpi),
        None if size.width.is_some() || size.height.is_some() => {
            RenderOptions::size(size.width, size.height)
        }
        None => RenderOptions::default(),
    };
    fs::create_dir_all(output)?;
    for rendered in render::convert(selection.source(&doc)?, &options)? {
        let path = output.join(format!("page-{}.png", rendered.page_index + 1));
        rendered.image.save(&path)?;
        println!("{}", path.display());
    }
    Ok(())
}

/// How to draw the objects of one page
struct Drawing {
    highlight: bool,
    labels: bool,
    dpi: u32,
    output: PathBuf,
}

impl Drawing {
    /// Returns whether anything was drawn
    fn draw<T: Boxable>(&self, doc: &Document, page: usize, objs: Vec<T>) -> Result<bool> {
        let image = if self.highlight {
            let opts = MarkOptions {
                label: self.labels,
                dpi: self.dpi,
                page: Some(page),
                ..MarkOptions::default()
            };
            mark(doc, objs, &opts)?
        } else {
            let opts = BoxOptions {
                label: self.labels,
                dpi: self.dpi,
                page: Some(page),
                ..BoxOptions::default()
            };
            draw_boxes(doc, objs, &opts)?
        };
        match image {
            Some(image) => {
                image.save(&self.output)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn boxes(input: &Path, page: usize, objects: Objects, drawing: &Drawing) -> Result<()> {
    let doc = open(input, Space::Screen)?;
    let index = page_indices(&doc, &[page])?[0];
    let pdf_page = doc.page(index)?;
    let drawn = match objects {
        Objects::Words => drawing.draw(&doc, index, text::words(pdf_page)?)?,
        Objects::Texts => drawing.draw(&doc, index, pdf_page.texts()?)?,
        Objects::Glyphs => {
            let glyphs = pdf_page.texts()?.into_iter().flat_map(|t| t.glyphs).collect();
            drawing.draw(&doc, index, glyphs)?
        }
        Objects::Paths => drawing.draw(&doc, index, pdf_page.paths()?)?,
        Objects::Images => drawing.draw(&doc, index, pdf_page.images()?)?,
        Objects::Xobjects => drawing.draw(&doc, index, pdf_page.xobjects()?)?,
        Objects::Annotations => drawing.draw(&doc, index, pdf_page.annotations()?)?,
        Objects::Tables => drawing.draw(&doc, index, tables::tables(pdf_page)?)?,
        Objects::Textboxes => {
            let laparams = LAParams::default();
            let ltpage = miner::extract_page(&pdf_page, Some(&laparams))?;
            drawing.draw(&doc, index, ltpage.textboxes().collect())?
        }
    };
    if drawn {
        println!("{}", drawing.output.display());
    } else {
        println!("Nothing to draw on page {page}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => info(&input)?,

        Commands::Words { selection, json } => words(&selection, json)?,

        Commands::Layout {
            selection,
            no_analysis,
            boxes_flow,
            detect_vertical,
            all_texts,
        } => {
            let laparams = if no_analysis {
                None
            } else {
                Some(LAParams {
                    boxes_flow: parse_boxes_flow(boxes_flow.as_deref())?,
                    detect_vertical,
                    all_texts,
                    ..LAParams::default()
                })
            };
            layout(&selection, laparams)?
        }

        Commands::Extract { selection, output } => extract(&selection, output.as_deref())?,

        Commands::Tables {
            selection,
            detector,
        } => find_tables(&selection, detector.as_deref())?,

        Commands::Render {
            selection,
            output,
            size,
        } => render_pages(&selection, &output, &size)?,

        Commands::Boxes {
            input,
            page,
            objects,
            highlight,
            no_labels,
            dpi,
            output,
        } => {
            let drawing = Drawing {
                highlight,
                labels: !no_labels,
                dpi,
                output,
            };
            boxes(&input, page, objects, &drawing)?
        }
    }

    Ok(())
}

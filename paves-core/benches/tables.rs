//! Table detection benchmarks
//!
//! Compares detecting tables over a whole tagged document, over a page
//! list, and page by page, plus the lattice detector on ruled pages.
//!
//! Run with: `cargo bench --bench tables`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lopdf::{dictionary, Object, Stream};
use paves::tables::{self, Detector, Lattice};
use paves::{Document, PdfSource};

/// Ruled 3x3 grid with one tagged cell of text
const PAGE_CONTENT: &str = "0.5 w
10 110 m 160 110 l S 10 140 m 160 140 l S 10 170 m 160 170 l S 10 190 m 160 190 l S
10 110 m 10 190 l S 60 110 m 60 190 l S 110 110 m 110 190 l S 160 110 m 160 190 l S
/TD <</MCID 0>> BDC BT /F1 10 Tf 15 175 Td (cell) Tj ET EMC
";

fn tagged_document(pages: usize) -> Document {
    let mut doc = lopdf::Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let mut kids = Vec::new();
    let mut elements = Vec::new();
    for _ in 0..pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, PAGE_CONTENT.as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(200), Object::Integer(200)],
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(Object::Reference(page_id));
        let element_id = doc.add_object(dictionary! {
            "Type" => "StructElem",
            "S" => "Table",
            "Pg" => page_id,
            "K" => vec![Object::Integer(0)],
        });
        elements.push(Object::Reference(element_id));
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => count }),
    );
    let root_id = doc.add_object(dictionary! { "Type" => "StructTreeRoot", "K" => elements });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "StructTreeRoot" => root_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialize benchmark PDF");
    Document::from_bytes(buffer).expect("load benchmark PDF")
}

fn benchmark_structure_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("structure_tables");
    for pages in [1usize, 10, 50] {
        let doc = tagged_document(pages);
        group.bench_with_input(BenchmarkId::new("document", pages), &doc, |b, doc| {
            b.iter(|| tables::tables(black_box(doc)).expect("tables"))
        });
        group.bench_with_input(BenchmarkId::new("pagelist", pages), &doc, |b, doc| {
            b.iter(|| tables::tables(black_box(doc.pages())).expect("tables"))
        });
        group.bench_with_input(BenchmarkId::new("per_page", pages), &doc, |b, doc| {
            b.iter(|| {
                doc.pages()
                    .iter()
                    .map(|page| tables::tables(page).expect("tables").len())
                    .sum::<usize>()
            })
        });
    }
    group.finish();
}

fn benchmark_lattice(c: &mut Criterion) {
    let mut group = c.benchmark_group("lattice_tables");
    let doc = tagged_document(10);
    let lattice = Lattice::default();
    group.bench_function("ten_ruled_pages", |b| {
        b.iter(|| lattice.detect(&PdfSource::from(black_box(&doc))).expect("tables"))
    });
    group.finish();
}

criterion_group!(benches, benchmark_structure_tables, benchmark_lattice);
criterion_main!(benches);

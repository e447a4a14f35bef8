//! Word reconstruction on generated pages

mod common;

use common::{assert_rect_close, text, PdfBuilder};
use paves::text::{text_objects, words};
use paves::Space;
use pretty_assertions::assert_eq;

#[test]
fn test_hello_world_screen_space() {
    let mut builder = PdfBuilder::new();
    builder.page(&text(20.0, 150.0, "Hello world"));
    let doc = builder.document();

    let found = words(&doc).unwrap();
    let texts: Vec<String> = found.iter().map(|w| w.text()).collect();
    assert_eq!(texts, vec!["Hello", "world"]);

    // Helvetica without a descriptor: ascent 0.75, descent -0.25
    assert_rect_close(found[0].bbox(), [20.0, 42.5, 42.78, 52.5]);
    let origin = found[1].origin();
    assert!((origin.x - 45.56).abs() < 1e-3);
    assert!((origin.y - 50.0).abs() < 1e-3);
}

#[test]
fn test_page_space_flips_y() {
    let mut builder = PdfBuilder::new();
    builder.page(&text(20.0, 150.0, "Hello"));
    let doc = builder.document().with_space(Space::Page);

    let found = words(doc.page(0).unwrap()).unwrap();
    assert_eq!(found.len(), 1);
    assert_rect_close(found[0].bbox(), [20.0, 147.5, 42.78, 157.5]);
}

#[test]
fn test_lines_become_separate_words() {
    let mut builder = PdfBuilder::new();
    builder.page("BT /F1 10 Tf 20 150 Td (abc) Tj 0 -12 Td (def) Tj ET");
    let doc = builder.document();

    let found = words(&doc).unwrap();
    let texts: Vec<String> = found.iter().map(|w| w.text()).collect();
    assert_eq!(texts, vec!["abc", "def"]);
    assert!(found[1].bbox().y0 > found[0].bbox().y0);
}

#[test]
fn test_adjacent_show_operators_join() {
    let mut builder = PdfBuilder::new();
    builder.page("BT /F1 10 Tf 20 150 Td (Hel) Tj (lo) Tj ET");
    let doc = builder.document();

    assert_eq!(text_objects(&doc).unwrap().len(), 2);
    let found = words(&doc).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].text(), "Hello");
    assert_eq!(found[0].glyphs().len(), 5);
}

#[test]
fn test_words_do_not_span_pages() {
    let mut builder = PdfBuilder::new();
    builder.page(&text(20.0, 150.0, "end"));
    builder.page(&text(20.0 + 16.68, 150.0, "ing"));
    let doc = builder.document();

    let found = words(&doc).unwrap();
    let pages: Vec<usize> = found.iter().map(|w| w.page_index).collect();
    assert_eq!(pages, vec![0, 1]);
}

#[test]
fn test_page_list_selection() {
    let mut builder = PdfBuilder::new();
    builder.page(&text(20.0, 150.0, "one"));
    builder.page(&text(20.0, 150.0, "two"));
    builder.page(&text(20.0, 150.0, "three"));
    let doc = builder.document();

    let selected = doc.pages().select([0, 2]).unwrap();
    let texts: Vec<String> = words(selected).unwrap().iter().map(|w| w.text()).collect();
    assert_eq!(texts, vec!["one", "three"]);
}

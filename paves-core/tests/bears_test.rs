//! Per-glyph records

mod common;

use common::{tagged_text, text, PdfBuilder};
use paves::bears;
use pretty_assertions::assert_eq;

#[test]
fn test_one_record_per_glyph() {
    let mut builder = PdfBuilder::new();
    builder.page(&text(20.0, 150.0, "Hi there"));
    builder.page(&tagged_text("P", 3, 20.0, 150.0, "ok"));
    let doc = builder.document();

    let records = bears::extract(&doc).unwrap();
    let texts: String = records.iter().filter_map(|r| r.text.as_deref()).collect();
    assert_eq!(texts, "Hi thereok");
    assert_eq!(records.len(), 10);

    let last = &records[9];
    assert_eq!(last.page_index, 1);
    assert_eq!(last.mcid, Some(3));
    assert_eq!(last.tag.as_deref(), Some("P"));
    assert_eq!(last.fontname, "Helvetica");
    assert!((last.size - 10.0).abs() < 1e-6);
}

#[test]
fn test_records_serialize_as_json_lines() {
    let mut builder = PdfBuilder::new();
    builder.page(&text(20.0, 150.0, "A"));
    let doc = builder.document();

    let records = bears::extract_page(&doc.page(0).unwrap()).unwrap();
    let line = serde_json::to_string(&records[0]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["object_type"], "char");
    assert_eq!(value["text"], "A");
    assert_eq!(value["page_index"], 0);
    assert!(value["mcid"].is_null());
    assert!((value["x1"].as_f64().unwrap() - 26.67).abs() < 1e-3);
}

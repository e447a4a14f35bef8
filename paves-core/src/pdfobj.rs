//! Helpers for reading values out of `lopdf` objects.
//!
//! All lookups follow indirect references and treat malformed values as
//! absent, so callers can fall back to defaults.

use crate::content::Operand;
use crate::geometry::{Matrix, Rect};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeMap;
use tracing::warn;

const MAX_REFERENCE_DEPTH: usize = 32;

/// Follow references until a direct object is reached.
pub fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> Option<&'a Object> {
    for _ in 0..MAX_REFERENCE_DEPTH {
        match obj {
            Object::Reference(id) => obj = doc.get_object(*id).ok()?,
            _ => return Some(obj),
        }
    }
    warn!("Reference chain too deep");
    None
}

/// Look up `key` and resolve it.
pub fn get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|obj| resolve(doc, obj))
}

pub fn get_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    get(doc, dict, key).and_then(as_dict)
}

pub fn get_array<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Vec<Object>> {
    match get(doc, dict, key)? {
        Object::Array(items) => Some(items),
        _ => None,
    }
}

pub fn get_stream<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Stream> {
    match get(doc, dict, key)? {
        Object::Stream(stream) => Some(stream),
        _ => None,
    }
}

pub fn get_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f64> {
    get(doc, dict, key).and_then(as_number)
}

pub fn get_name(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    get(doc, dict, key).and_then(as_name)
}

/// Text string (PDFDocEncoding or UTF-16BE with BOM).
pub fn get_text(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match get(doc, dict, key)? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

pub fn get_rect(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<Rect> {
    get(doc, dict, key).and_then(|obj| as_rect(doc, obj))
}

pub fn get_matrix(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<Matrix> {
    let items = get_array(doc, dict, key)?;
    let values = numbers(doc, items);
    if values.len() != 6 {
        return None;
    }
    Some(Matrix::new(
        values[0], values[1], values[2], values[3], values[4], values[5],
    ))
}

/// A dictionary, or the dictionary of a stream.
pub fn as_dict(obj: &Object) -> Option<&Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

pub fn as_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

pub fn as_name(obj: &Object) -> Option<String> {
    match obj {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// All numeric entries of an array, resolving references.
pub fn numbers(doc: &Document, items: &[Object]) -> Vec<f64> {
    items
        .iter()
        .filter_map(|item| resolve(doc, item).and_then(as_number))
        .collect()
}

/// A normalized rectangle from a four-number array.
pub fn as_rect(doc: &Document, obj: &Object) -> Option<Rect> {
    let Object::Array(items) = obj else {
        return None;
    };
    let values = numbers(doc, items);
    if values.len() != 4 {
        return None;
    }
    Some(Rect::new(
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    ))
}

/// Decoded stream data. Streams with unsupported filters yield their raw bytes.
pub fn stream_data(stream: &Stream) -> Vec<u8> {
    if stream.dict.has(b"Filter") {
        match stream.decompressed_content() {
            Ok(data) => data,
            Err(e) => {
                warn!("Could not decode stream, using raw data: {e}");
                stream.content.clone()
            }
        }
    } else {
        stream.content.clone()
    }
}

/// Decode a PDF text string.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if bytes.len() >= 3 && bytes[..3] == [0xEF, 0xBB, 0xBF] {
        String::from_utf8_lossy(&bytes[3..]).into_owned()
    } else {
        // PDFDocEncoding agrees with Latin-1 for the printable range
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Reference id of `key` if it is an indirect object.
pub fn get_reference(dict: &Dictionary, key: &[u8]) -> Option<ObjectId> {
    match dict.get(key).ok()? {
        Object::Reference(id) => Some(*id),
        _ => None,
    }
}

/// Convert a PDF object into a content stream operand (used for
/// marked-content property lists stored in resources).
pub fn to_operand(doc: &Document, obj: &Object, depth: usize) -> Operand {
    if depth > MAX_REFERENCE_DEPTH {
        return Operand::Null;
    }
    match obj {
        Object::Null => Operand::Null,
        Object::Boolean(b) => Operand::Bool(*b),
        Object::Integer(i) => Operand::Integer(*i),
        Object::Real(r) => Operand::Real(*r as f64),
        Object::Name(name) => Operand::Name(String::from_utf8_lossy(name).into_owned()),
        Object::String(bytes, _) => Operand::String(bytes.clone()),
        Object::Array(items) => Operand::Array(
            items
                .iter()
                .map(|item| to_operand(doc, item, depth + 1))
                .collect(),
        ),
        Object::Dictionary(dict) => Operand::Dict(dict_to_operands(doc, dict, depth)),
        Object::Stream(stream) => Operand::Dict(dict_to_operands(doc, &stream.dict, depth)),
        Object::Reference(_) => match resolve(doc, obj) {
            Some(target) => to_operand(doc, target, depth + 1),
            None => Operand::Null,
        },
    }
}

fn dict_to_operands(doc: &Document, dict: &Dictionary, depth: usize) -> BTreeMap<String, Operand> {
    dict.iter()
        .map(|(key, value)| {
            (
                String::from_utf8_lossy(key).into_owned(),
                to_operand(doc, value, depth + 1),
            )
        })
        .collect()
}

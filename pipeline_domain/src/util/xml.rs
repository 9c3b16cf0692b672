// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! XML rendering for the record pipeline, per spec.md §4.8.
//!
//! `records_to_xml` writes `<root><item>...</item></root>` with a leading
//! UTF-8 declaration, one child element per record field. Field keys that
//! are not valid XML names are sanitized to `[A-Za-z_][A-Za-z0-9._-]*`: a
//! leading character outside `[A-Za-z_]` is replaced with `_`, and later
//! characters outside `[A-Za-z0-9._-]` are replaced with `_`.

use crate::error::PipelineError;
use crate::record::Record;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;
use serde_json::Value;
use std::io::Cursor;

fn sanitize_name(key: &str) -> String {
    let mut chars = key.chars();
    let mut out = String::with_capacity(key.len());
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => out.push(c),
        _ => out.push('_'),
    }
    for c in chars {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Serializes records into a `root` document, one `item` element per record.
pub fn records_to_xml(records: &[Record], root: &str, item: &str) -> Result<String, PipelineError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new(root)))
        .map_err(xml_err)?;

    for record in records {
        writer
            .write_event(Event::Start(BytesStart::new(item)))
            .map_err(xml_err)?;
        for (key, value) in record.iter() {
            let tag = sanitize_name(key);
            writer
                .write_event(Event::Start(BytesStart::new(tag.as_str())))
                .map_err(xml_err)?;
            let text = value_to_text(value);
            if !text.is_empty() {
                writer
                    .write_event(Event::Text(BytesText::new(&text)))
                    .map_err(xml_err)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(tag.as_str())))
                .map_err(xml_err)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(item)))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(root)))
        .map_err(xml_err)?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| PipelineError::SerializationError(e.to_string()))
}

fn xml_err(e: quick_xml::Error) -> PipelineError {
    PipelineError::SerializationError(format!("xml write: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitizes_invalid_element_names() {
        assert_eq!(sanitize_name("1st name"), "_st_name");
        assert_eq!(sanitize_name("order.id"), "order.id");
        assert_eq!(sanitize_name("valid_key"), "valid_key");
    }

    #[test]
    fn renders_records_as_elements() {
        let mut record = Record::new();
        record.insert("id".into(), json!(1));
        record.insert("name".into(), json!("Ada"));
        let xml = records_to_xml(&[record], "records", "record").unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<records>"));
        assert!(xml.contains("<record>"));
        assert!(xml.contains("<id>1</id>"));
        assert!(xml.contains("<name>Ada</name>"));
    }

    #[test]
    fn empty_value_produces_empty_element() {
        let mut record = Record::new();
        record.insert("note".into(), Value::Null);
        let xml = records_to_xml(&[record], "records", "record").unwrap();
        assert!(xml.contains("<note></note>") || xml.contains("<note/>"));
    }
}

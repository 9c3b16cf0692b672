// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! CSV codec for the record pipeline, per spec.md §4.8.
//!
//! `parse_csv` reads delimited text (quoted fields with `""` escaping per
//! RFC 4180) into records keyed by the header row, or by positional index
//! `"0"`, `"1"`, … when `has_header` is false; every value is parsed as a
//! string (callers coerce types downstream via operators). `records_to_csv`
//! writes records back out using the union of the first record's keys.

use crate::error::PipelineError;
use crate::record::Record;
use serde_json::Value;

/// Parses delimited text into records. When `has_header` is true the first
/// row supplies field names; otherwise fields are keyed by column index.
pub fn parse_csv(text: &str, delim: u8, has_header: bool) -> Result<Vec<Record>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(has_header)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = if has_header {
        reader
            .headers()
            .map_err(|e| PipelineError::SerializationError(format!("csv header: {e}")))?
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        Vec::new()
    };

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| PipelineError::SerializationError(format!("csv row: {e}")))?;
        let mut record = Record::new();
        for (idx, field) in row.iter().enumerate() {
            let key = headers
                .get(idx)
                .cloned()
                .unwrap_or_else(|| idx.to_string());
            record.insert(key, Value::String(field.to_string()));
        }
        records.push(record);
    }
    Ok(records)
}

/// Serializes records to delimited text. The header row (when
/// `include_header` is set) is the union of the first record's keys, in
/// insertion order; later records that lack a key contribute an empty field.
pub fn records_to_csv(records: &[Record], delim: u8, include_header: bool) -> Result<String, PipelineError> {
    let headers: Vec<String> = records
        .first()
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default();

    let mut writer = csv::WriterBuilder::new().delimiter(delim).from_writer(Vec::new());
    if include_header {
        writer
            .write_record(&headers)
            .map_err(|e| PipelineError::SerializationError(format!("csv header write: {e}")))?;
    }

    for record in records {
        let row: Vec<String> = headers
            .iter()
            .map(|key| match record.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            })
            .collect();
        writer
            .write_record(&row)
            .map_err(|e| PipelineError::SerializationError(format!("csv row write: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| PipelineError::SerializationError(format!("csv flush: {e}")))?;
    String::from_utf8(bytes).map_err(|e| PipelineError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_header_and_rows() {
        let records = parse_csv("a,b\n1,2\n3,4\n", b',', true).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("a"), Some(&json!("1")));
        assert_eq!(records[1].get("b"), Some(&json!("4")));
    }

    #[test]
    fn parses_without_header_using_positional_keys() {
        let records = parse_csv("1,2\n3,4\n", b',', false).unwrap();
        assert_eq!(records[0].get("0"), Some(&json!("1")));
        assert_eq!(records[1].get("1"), Some(&json!("4")));
    }

    #[test]
    fn quotes_fields_containing_commas() {
        let mut record = Record::new();
        record.insert("name".into(), json!("Doe, Jane"));
        let csv = records_to_csv(&[record], b',', true).unwrap();
        assert!(csv.contains("\"Doe, Jane\""));
    }

    #[test]
    fn round_trips_first_records_keys() {
        let mut r1 = Record::new();
        r1.insert("a".into(), json!("1"));
        r1.insert("b".into(), json!("x"));
        let mut r2 = Record::new();
        r2.insert("a".into(), json!("2"));
        r2.insert("b".into(), json!("y"));
        let csv = records_to_csv(&[r1, r2], b',', true).unwrap();
        let parsed = parse_csv(&csv, b',', true).unwrap();
        assert_eq!(parsed[0].get("a"), Some(&json!("1")));
        assert_eq!(parsed[1].get("b"), Some(&json!("y")));
    }
}

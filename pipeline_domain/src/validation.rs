// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Pure field validation backing a VALIDATE step (spec.md §4.2). The
//! scheduler-facing executor lives in the engine crate; this module only
//! checks one record against a field-spec map and returns the list of
//! human-readable error messages (empty = passes).

use crate::record::{as_value, Record};
use crate::util::path;
use crate::value_objects::{FieldSpec, FieldType, ValidateRule};
use serde_json::Value;
use std::collections::BTreeMap;

/// Converts the alternate `{rules: [{spec: {field, ...}}]}` VALIDATE shape
/// into the `{fields: {path: FieldSpec}}` form used by [`validate_record`].
pub fn rules_to_fields(rules: Vec<ValidateRule>) -> BTreeMap<String, FieldSpec> {
    rules.into_iter().map(|rule| (rule.spec.field, rule.spec.spec)).collect()
}

/// Validates one record against `fields`, returning every failing field's
/// message. An empty result means the record passes every check.
pub fn validate_record(record: &Record, fields: &BTreeMap<String, FieldSpec>) -> Vec<String> {
    let wrapped = as_value(record);
    let mut errors = Vec::new();
    for (field_path, spec) in fields {
        if let Some(message) = validate_field(&wrapped, field_path, spec) {
            errors.push(message);
        }
    }
    errors
}

fn validate_field(wrapped: &Value, field_path: &str, spec: &FieldSpec) -> Option<String> {
    let value = path::get(wrapped, field_path);
    let is_empty = matches!(value, None | Some(Value::Null))
        || matches!(value, Some(Value::String(s)) if s.is_empty());

    if spec.required && is_empty {
        return Some(format!("{field_path} is required"));
    }
    let value = value?;
    if is_empty {
        return None;
    }

    if let Some(expected) = spec.field_type {
        if !matches_type(value, expected) {
            return Some(format!("{field_path} must be of type {}", type_name(expected)));
        }
    }

    if let Value::Number(n) = value {
        let n = n.as_f64().unwrap_or(f64::NAN);
        if let Some(min) = spec.min {
            if n < min {
                return Some(format!("{field_path} must be >= {min}"));
            }
        }
        if let Some(max) = spec.max {
            if n > max {
                return Some(format!("{field_path} must be <= {max}"));
            }
        }
    }

    if let Value::String(s) = value {
        if let Some(min_len) = spec.min_length {
            if s.chars().count() < min_len {
                return Some(format!("{field_path} must have length >= {min_len}"));
            }
        }
        if let Some(max_len) = spec.max_length {
            if s.chars().count() > max_len {
                return Some(format!("{field_path} must have length <= {max_len}"));
            }
        }
        if let Some(pattern) = &spec.pattern {
            match regex::Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => {
                    return Some(format!("{field_path} does not match pattern {pattern}"));
                }
                Err(_) => return Some(format!("{field_path} has an invalid pattern {pattern}")),
                _ => {}
            }
        }
    }

    if let Some(allowed) = &spec.r#enum {
        if !allowed.contains(value) {
            return Some(format!("{field_path} is not one of the allowed values"));
        }
    }

    None
}

fn matches_type(value: &Value, expected: FieldType) -> bool {
    match expected {
        FieldType::String => value.is_string(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
    }
}

fn type_name(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::String => "string",
        FieldType::Number => "number",
        FieldType::Boolean => "boolean",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(entries: &[(&str, FieldSpec)]) -> BTreeMap<String, FieldSpec> {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn required_rejects_empty_string() {
        let mut record = Record::new();
        record.insert("email".into(), json!(""));
        let spec = FieldSpec {
            required: true,
            field_type: Some(FieldType::String),
            ..Default::default()
        };
        let errors = validate_record(&record, &fields(&[("email", spec)]));
        assert_eq!(errors, vec!["email is required".to_string()]);
    }

    #[test]
    fn valid_record_passes() {
        let mut record = Record::new();
        record.insert("email".into(), json!("a@b.com"));
        let spec = FieldSpec {
            required: true,
            field_type: Some(FieldType::String),
            ..Default::default()
        };
        let errors = validate_record(&record, &fields(&[("email", spec)]));
        assert!(errors.is_empty());
    }

    #[test]
    fn min_max_bounds_numbers() {
        let mut record = Record::new();
        record.insert("age".into(), json!(150));
        let spec = FieldSpec {
            max: Some(120.0),
            ..Default::default()
        };
        let errors = validate_record(&record, &fields(&[("age", spec)]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("age"));
    }

    #[test]
    fn pattern_rejects_non_matching_strings() {
        let mut record = Record::new();
        record.insert("code".into(), json!("abc"));
        let spec = FieldSpec {
            pattern: Some(r"^\d+$".to_string()),
            ..Default::default()
        };
        let errors = validate_record(&record, &fields(&[("code", spec)]));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn enum_membership() {
        let mut record = Record::new();
        record.insert("status".into(), json!("archived"));
        let spec = FieldSpec {
            r#enum: Some(vec![json!("active"), json!("inactive")]),
            ..Default::default()
        };
        let errors = validate_record(&record, &fields(&[("status", spec)]));
        assert_eq!(errors.len(), 1);
    }
}

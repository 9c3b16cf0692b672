// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The universal currency passing between steps: an unordered mapping from
//! string keys to JSON values. Equality is structural (`serde_json::Value`'s
//! `PartialEq` already compares maps key-by-key regardless of insertion
//! order).

use serde_json::Value;

/// A single record flowing through the pipeline.
pub type Record = serde_json::Map<String, Value>;

/// Convenience constructor for an empty record.
pub fn empty_record() -> Record {
    serde_json::Map::new()
}

/// Wraps a `Record` as a `Value::Object` for dotted-path traversal.
pub fn as_value(record: &Record) -> Value {
    Value::Object(record.clone())
}

/// Unwraps a `Value::Object` back into a `Record`, discarding non-object
/// values (callers that need this guarantee should validate upstream).
pub fn from_value(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => empty_record(),
    }
}

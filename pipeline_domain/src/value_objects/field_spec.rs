// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `FieldSpec` — one field's validation rule set for a VALIDATE step
//! (spec.md §4.2).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The checks applied to a single dotted-path field by VALIDATE.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "minLength")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "maxLength")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#enum: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
}

/// A single entry of the alternate `{rules: [{spec: {field, ...}}]}` VALIDATE
/// shape; converted into the `fields` map form before evaluation.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateRule {
    pub spec: ValidateRuleSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateRuleSpec {
    pub field: String,
    #[serde(flatten)]
    pub spec: FieldSpec,
}

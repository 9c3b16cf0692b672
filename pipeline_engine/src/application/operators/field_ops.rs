// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Single-record field operators from the built-in catalog (spec.md §4.2):
//! `map`, `template`, `lookup`, `currency`, `unit`, `set`, `remove`, `rename`.

use async_trait::async_trait;
use pipeline_domain::error::PipelineError;
use pipeline_domain::record::Record;
use pipeline_domain::repositories::operator::{Operator, OperatorHelpers};
use serde_json::Value;

fn args_str(args: &Value, key: &str) -> Result<String, PipelineError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PipelineError::invalid_config(format!("operator argument '{key}' is required")))
}

/// `{ "set": { "targetPath": "sourcePath", ... } }` — copies values between
/// dotted paths within the same record.
pub struct MapOperator;

#[async_trait]
impl Operator for MapOperator {
    async fn apply_one(
        &self,
        mut record: Record,
        args: &Value,
        helpers: &OperatorHelpers,
    ) -> Result<Option<Record>, PipelineError> {
        let mappings = args
            .get("set")
            .and_then(Value::as_object)
            .ok_or_else(|| PipelineError::invalid_config("'map' requires a 'set' object"))?;
        for (target, source) in mappings {
            let Some(source_path) = source.as_str() else { continue };
            if let Some(value) = helpers.get(&record, source_path).cloned() {
                helpers.set(&mut record, target, value);
            }
        }
        Ok(Some(record))
    }
}

/// `{ "targetPath": "...", "template": "Hello, {{name}}!" }`.
pub struct TemplateOperator;

#[async_trait]
impl Operator for TemplateOperator {
    async fn apply_one(
        &self,
        mut record: Record,
        args: &Value,
        helpers: &OperatorHelpers,
    ) -> Result<Option<Record>, PipelineError> {
        let target_path = args_str(args, "targetPath")?;
        let template = args_str(args, "template")?;
        let rendered = helpers.format().template(&template, &record);
        helpers.set(&mut record, &target_path, Value::String(rendered));
        Ok(Some(record))
    }
}

/// `{ "field": "...", "targetPath": "...", "table": {...}, "default": value }`
/// — static table lookup.
pub struct LookupOperator;

#[async_trait]
impl Operator for LookupOperator {
    async fn apply_one(
        &self,
        mut record: Record,
        args: &Value,
        helpers: &OperatorHelpers,
    ) -> Result<Option<Record>, PipelineError> {
        let field = args_str(args, "field")?;
        let target_path = args_str(args, "targetPath")?;
        let table = args
            .get("table")
            .and_then(Value::as_object)
            .ok_or_else(|| PipelineError::invalid_config("'lookup' requires a 'table' object"))?;
        let key = helpers.get(&record, &field).and_then(Value::as_str).unwrap_or_default();
        let resolved = table
            .get(key)
            .cloned()
            .or_else(|| args.get("default").cloned())
            .unwrap_or(Value::Null);
        helpers.set(&mut record, &target_path, resolved);
        Ok(Some(record))
    }
}

/// `{ "field": "...", "targetPath": "...", "code": "USD" }`.
pub struct CurrencyOperator;

#[async_trait]
impl Operator for CurrencyOperator {
    async fn apply_one(
        &self,
        mut record: Record,
        args: &Value,
        helpers: &OperatorHelpers,
    ) -> Result<Option<Record>, PipelineError> {
        let field = args_str(args, "field")?;
        let target_path = args_str(args, "targetPath")?;
        let code = args_str(args, "code")?;
        let amount = helpers.get(&record, &field).and_then(Value::as_f64).unwrap_or(0.0);
        let formatted = helpers.format().currency(amount, &code);
        helpers.set(&mut record, &target_path, Value::String(formatted));
        Ok(Some(record))
    }
}

/// `{ "field": "...", "targetPath": "...", "from": "kg", "to": "lb" }`.
pub struct UnitOperator;

#[async_trait]
impl Operator for UnitOperator {
    async fn apply_one(
        &self,
        mut record: Record,
        args: &Value,
        helpers: &OperatorHelpers,
    ) -> Result<Option<Record>, PipelineError> {
        let field = args_str(args, "field")?;
        let target_path = args_str(args, "targetPath")?;
        let from = args_str(args, "from")?;
        let to = args_str(args, "to")?;
        let value = helpers.get(&record, &field).and_then(Value::as_f64).unwrap_or(0.0);
        let converted = helpers.convert().unit(value, &from, &to);
        helpers.set(&mut record, &target_path, serde_json::json!(converted));
        Ok(Some(record))
    }
}

/// `{ "path": "...", "value": <literal> }`.
pub struct SetOperator;

#[async_trait]
impl Operator for SetOperator {
    async fn apply_one(
        &self,
        mut record: Record,
        args: &Value,
        helpers: &OperatorHelpers,
    ) -> Result<Option<Record>, PipelineError> {
        let path = args_str(args, "path")?;
        let value = args.get("value").cloned().unwrap_or(Value::Null);
        helpers.set(&mut record, &path, value);
        Ok(Some(record))
    }
}

/// `{ "paths": ["...", ...] }`.
pub struct RemoveOperator;

#[async_trait]
impl Operator for RemoveOperator {
    async fn apply_one(
        &self,
        mut record: Record,
        args: &Value,
        helpers: &OperatorHelpers,
    ) -> Result<Option<Record>, PipelineError> {
        let paths = args
            .get("paths")
            .and_then(Value::as_array)
            .ok_or_else(|| PipelineError::invalid_config("'remove' requires a 'paths' array"))?;
        for path in paths {
            if let Some(path) = path.as_str() {
                helpers.remove(&mut record, path);
            }
        }
        Ok(Some(record))
    }
}

/// `{ "from": "...", "to": "..." }`.
pub struct RenameOperator;

#[async_trait]
impl Operator for RenameOperator {
    async fn apply_one(
        &self,
        mut record: Record,
        args: &Value,
        helpers: &OperatorHelpers,
    ) -> Result<Option<Record>, PipelineError> {
        let from = args_str(args, "from")?;
        let to = args_str(args, "to")?;
        if let Some(value) = helpers.get(&record, &from).cloned() {
            helpers.remove(&mut record, &from);
            helpers.set(&mut record, &to, value);
        }
        Ok(Some(record))
    }
}

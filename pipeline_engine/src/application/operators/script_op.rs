// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `script` — runs a whitelisted expression (§4.7) against the record,
//! writing the result to `targetPath`, or merging it into the record if the
//! result is an object and no `targetPath` is given.

use async_trait::async_trait;
use pipeline_domain::error::PipelineError;
use pipeline_domain::record::{as_value, from_value, Record};
use pipeline_domain::repositories::operator::{Operator, OperatorHelpers};
use serde_json::Value;

use crate::application::expression;

const DEFAULT_TIMEOUT_MS: u64 = 50;

/// `{ "expression": "price * qty", "targetPath": "total", "timeoutMs": 50 }`.
/// Disabled entirely when `args.scriptOperatorsEnabled == false`, per
/// spec.md §4.7.
pub struct ScriptOperator;

#[async_trait]
impl Operator for ScriptOperator {
    async fn apply_one(
        &self,
        mut record: Record,
        args: &Value,
        _helpers: &OperatorHelpers,
    ) -> Result<Option<Record>, PipelineError> {
        let enabled = args.get("scriptOperatorsEnabled").and_then(Value::as_bool).unwrap_or(true);
        let expr = args
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| PipelineError::invalid_config("'script' requires an 'expression'"))?;
        let timeout_ms = args.get("timeoutMs").and_then(Value::as_u64).unwrap_or(DEFAULT_TIMEOUT_MS);

        let context = as_value(&record).as_object().cloned().unwrap_or_default();
        let result = expression::evaluate_with_mode(expr, &context, timeout_ms, enabled);
        if !result.success {
            return Err(PipelineError::record(
                "script",
                result.error.unwrap_or_else(|| "expression evaluation failed".to_string()),
            ));
        }
        let value = result.value.unwrap_or(Value::Null);

        match args.get("targetPath").and_then(Value::as_str) {
            Some(target) => {
                let mut wrapped = as_value(&record);
                pipeline_domain::util::path::set(&mut wrapped, target, value);
                record = from_value(wrapped);
            }
            None => {
                if let Value::Object(fields) = value {
                    record.extend(fields);
                }
            }
        }
        Ok(Some(record))
    }
}

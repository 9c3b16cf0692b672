// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Filtering operators from the built-in catalog (spec.md §4.2): `when`,
//! `validateRequired`, `validateFormat`, `deltaFilter`.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use pipeline_domain::error::PipelineError;
use pipeline_domain::record::{as_value, Record};
use pipeline_domain::repositories::operator::{Operator, OperatorHelpers};
use pipeline_domain::value_objects::RouteCondition;
use serde_json::Value;

fn matches_all(record_value: &Value, conditions: &[RouteCondition]) -> bool {
    conditions.iter().all(|c| matches_one(record_value, c))
}

fn matches_one(record_value: &Value, condition: &RouteCondition) -> bool {
    use pipeline_domain::util::path;
    use pipeline_domain::value_objects::RouteCmp;

    let field = path::get(record_value, &condition.field);
    match condition.cmp {
        RouteCmp::Exists => field.is_some() && !matches!(field, Some(Value::Null)),
        RouteCmp::IsNull => field.is_none() || matches!(field, Some(Value::Null)),
        _ => {
            let Some(field) = field else { return false };
            match condition.cmp {
                RouteCmp::Eq => field == &condition.value,
                RouteCmp::Ne => field != &condition.value,
                RouteCmp::Gt => num_cmp(field, &condition.value).is_some_and(|o| o.is_gt()),
                RouteCmp::Lt => num_cmp(field, &condition.value).is_some_and(|o| o.is_lt()),
                RouteCmp::Gte => num_cmp(field, &condition.value).is_some_and(|o| !o.is_lt()),
                RouteCmp::Lte => num_cmp(field, &condition.value).is_some_and(|o| !o.is_gt()),
                RouteCmp::In => condition.value.as_array().is_some_and(|arr| arr.contains(field)),
                RouteCmp::NotIn => !condition.value.as_array().is_some_and(|arr| arr.contains(field)),
                RouteCmp::Contains => as_str(field).zip(as_str(&condition.value)).is_some_and(|(f, v)| f.contains(v)),
                RouteCmp::NotContains => {
                    !as_str(field).zip(as_str(&condition.value)).is_some_and(|(f, v)| f.contains(v))
                }
                RouteCmp::StartsWith => {
                    as_str(field).zip(as_str(&condition.value)).is_some_and(|(f, v)| f.starts_with(v))
                }
                RouteCmp::EndsWith => {
                    as_str(field).zip(as_str(&condition.value)).is_some_and(|(f, v)| f.ends_with(v))
                }
                RouteCmp::Regex => as_str(field)
                    .zip(as_str(&condition.value))
                    .is_some_and(|(f, v)| regex::Regex::new(v).is_ok_and(|re| re.is_match(f))),
                RouteCmp::Exists | RouteCmp::IsNull => unreachable!("handled above"),
            }
        }
    }
}

fn as_str(value: &Value) -> Option<&str> {
    value.as_str()
}

fn num_cmp(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// `{ "when": [{ "field", "cmp", "value" }, ...] }` — keeps a record only
/// if every condition matches (the same per-branch semantics as ROUTE).
pub struct WhenOperator;

#[async_trait]
impl Operator for WhenOperator {
    async fn apply_one(
        &self,
        record: Record,
        args: &Value,
        _helpers: &OperatorHelpers,
    ) -> Result<Option<Record>, PipelineError> {
        let conditions: Vec<RouteCondition> = serde_json::from_value(
            args.get("when")
                .cloned()
                .ok_or_else(|| PipelineError::invalid_config("'when' requires a 'when' array"))?,
        )
        .map_err(|e| PipelineError::invalid_config(format!("invalid 'when' condition: {e}")))?;
        let wrapped = as_value(&record);
        if matches_all(&wrapped, &conditions) {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }
}

/// `{ "fields": ["path", ...] }` — drops a record if any listed field is
/// missing, null, or an empty string.
pub struct ValidateRequiredOperator;

#[async_trait]
impl Operator for ValidateRequiredOperator {
    async fn apply_one(
        &self,
        record: Record,
        args: &Value,
        helpers: &OperatorHelpers,
    ) -> Result<Option<Record>, PipelineError> {
        let fields = args
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| PipelineError::invalid_config("'validateRequired' requires a 'fields' array"))?;
        for field in fields {
            let Some(path) = field.as_str() else { continue };
            let present = match helpers.get(&record, path) {
                Some(Value::Null) | None => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            };
            if !present {
                return Ok(None);
            }
        }
        Ok(Some(record))
    }
}

/// `{ "field": "path", "pattern": "regex" }` — drops a record if the field
/// is not a string matching `pattern`.
pub struct ValidateFormatOperator;

#[async_trait]
impl Operator for ValidateFormatOperator {
    async fn apply_one(
        &self,
        record: Record,
        args: &Value,
        helpers: &OperatorHelpers,
    ) -> Result<Option<Record>, PipelineError> {
        let field = args
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| PipelineError::invalid_config("'validateFormat' requires a 'field'"))?;
        let pattern = args
            .get("pattern")
            .and_then(Value::as_str)
            .ok_or_else(|| PipelineError::invalid_config("'validateFormat' requires a 'pattern'"))?;
        let re = regex::Regex::new(pattern).map_err(|e| PipelineError::invalid_config(format!("bad regex: {e}")))?;
        match helpers.get(&record, field).and_then(Value::as_str) {
            Some(value) if re.is_match(value) => Ok(Some(record)),
            _ => Ok(None),
        }
    }
}

/// `{ "field": "path" }` — batch operator that drops records whose `field`
/// value has already been seen earlier in the batch, keeping the first
/// occurrence (the in-batch counterpart of the scheduler's idempotency-key
/// dedup).
pub struct DeltaFilterOperator {
    seen: Mutex<HashSet<String>>,
}

impl DeltaFilterOperator {
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(HashSet::new()),
        }
    }
}

impl Default for DeltaFilterOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Operator for DeltaFilterOperator {
    async fn apply(
        &self,
        records: Vec<Record>,
        args: &Value,
        helpers: &OperatorHelpers,
    ) -> Result<Vec<Record>, PipelineError> {
        let field = args
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| PipelineError::invalid_config("'deltaFilter' requires a 'field'"))?;
        let mut seen = self.seen.lock().unwrap();
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            let key = helpers
                .get(&record, field)
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default();
            if seen.insert(key) {
                out.push(record);
            }
        }
        Ok(out)
    }
}

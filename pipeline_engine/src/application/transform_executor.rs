// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `TransformExecutor` — runs TRANSFORM, ENRICH, VALIDATE, and ROUTE steps
//! (spec.md §4.2).

use std::collections::BTreeMap;
use std::time::Duration;

use pipeline_domain::entities::Output;
use pipeline_domain::error::PipelineError;
use pipeline_domain::record::Record;
use pipeline_domain::repositories::callbacks::OnRecordError;
use pipeline_domain::repositories::operator::OperatorHelpers;
use pipeline_domain::routing;
use pipeline_domain::validation::{rules_to_fields, validate_record};
use pipeline_domain::value_objects::{ErrorHandlingPolicy, FieldSpec, RetryPerRecord, RouteBranch, StepKey, ValidateRule};
use serde_json::Value;

use crate::application::operator_registry::OperatorRegistry;

pub struct TransformExecutor;

impl TransformExecutor {
    /// Runs the operator chain declared by `config` against `records`.
    /// `config` is either `{ adapterCode, ...args }` (single operator) or
    /// `{ operators: [{ op, args }, ...] }` (sequential chain, output of
    /// operator *i* feeds operator *i+1*).
    pub async fn execute_operator(
        step_key: &StepKey,
        config: &Value,
        mut records: Vec<Record>,
        registry: &OperatorRegistry,
        helpers: &OperatorHelpers,
        on_record_error: Option<&dyn OnRecordError>,
    ) -> Result<Vec<Record>, PipelineError> {
        for (code, args) in operator_steps(config)? {
            let operator = registry.get(&code, step_key.as_str())?;
            let retry = config
                .get("retryPerRecord")
                .map(|v| serde_json::from_value::<RetryPerRecord>(v.clone()))
                .transpose()
                .map_err(|e| PipelineError::invalid_config(format!("invalid 'retryPerRecord': {e}")))?;

            records = match retry {
                None => operator.apply(records, &args, helpers).await?,
                Some(retry) => run_with_retry(operator.as_ref(), records, &args, helpers, &retry, step_key, on_record_error).await,
            };
        }
        Ok(records)
    }

    /// Runs VALIDATE: every record is checked against `fields`; a failing
    /// record is dropped and reported via `on_record_error`, a passing one
    /// flows to `out`. `error_handling` is unused here — a field rejection
    /// is a RecordError, which spec.md's propagation policy recovers
    /// locally regardless of FAIL_FAST/COLLECT; FAIL_FAST only escalates a
    /// *handler* failure (TRANSFORM/LOAD throwing), not an expected
    /// per-record validation rejection.
    pub fn execute_validate(
        step_key: &StepKey,
        config: &Value,
        records: Vec<Record>,
        _error_handling: &ErrorHandlingPolicy,
        on_record_error: Option<&dyn OnRecordError>,
    ) -> Result<Vec<Record>, PipelineError> {
        let fields = fields_from_config(config)?;
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            let errors = validate_record(&record, &fields);
            if errors.is_empty() {
                out.push(record);
                continue;
            }
            let message = errors.join("; ");
            if let Some(cb) = on_record_error {
                cb.on_record_error(step_key, &message, &record);
            }
        }
        Ok(out)
    }

    /// Linear-mode ROUTE: returns the records of the first branch with at
    /// least one match, or `[]`.
    pub fn execute_route(config: &Value, records: Vec<Record>) -> Result<Vec<Record>, PipelineError> {
        let branches = branches_from_config(config)?;
        Ok(routing::first_branch_with_any_match(records, &branches))
    }

    /// Graph-mode ROUTE: partitions every record into exactly one branch.
    pub fn execute_route_branches(config: &Value, records: Vec<Record>) -> Result<Output, PipelineError> {
        let branches = branches_from_config(config)?;
        let partitioned = routing::partition_into_branches(records, &branches);
        Ok(Output::Branches(partitioned))
    }
}

fn operator_steps(config: &Value) -> Result<Vec<(String, Value)>, PipelineError> {
    if let Some(operators) = config.get("operators").and_then(Value::as_array) {
        operators
            .iter()
            .map(|entry| {
                let op = entry
                    .get("op")
                    .and_then(Value::as_str)
                    .ok_or_else(|| PipelineError::invalid_config("chained operator entry missing 'op'"))?;
                let args = entry.get("args").cloned().unwrap_or(Value::Object(Default::default()));
                Ok((op.to_string(), args))
            })
            .collect()
    } else if let Some(code) = config.get("adapterCode").and_then(Value::as_str) {
        Ok(vec![(code.to_string(), config.clone())])
    } else {
        Err(PipelineError::invalid_config(
            "transform step config requires 'adapterCode' or 'operators'",
        ))
    }
}

fn fields_from_config(config: &Value) -> Result<BTreeMap<String, FieldSpec>, PipelineError> {
    if let Some(fields) = config.get("fields") {
        serde_json::from_value(fields.clone()).map_err(|e| PipelineError::invalid_config(format!("invalid 'fields': {e}")))
    } else if let Some(rules) = config.get("rules") {
        let rules: Vec<ValidateRule> =
            serde_json::from_value(rules.clone()).map_err(|e| PipelineError::invalid_config(format!("invalid 'rules': {e}")))?;
        Ok(rules_to_fields(rules))
    } else {
        Err(PipelineError::invalid_config("VALIDATE config requires 'fields' or 'rules'"))
    }
}

fn branches_from_config(config: &Value) -> Result<Vec<RouteBranch>, PipelineError> {
    let branches = config
        .get("branches")
        .ok_or_else(|| PipelineError::invalid_config("ROUTE config requires 'branches'"))?;
    serde_json::from_value(branches.clone()).map_err(|e| PipelineError::invalid_config(format!("invalid 'branches': {e}")))
}

async fn run_with_retry(
    operator: &dyn pipeline_domain::repositories::operator::Operator,
    records: Vec<Record>,
    args: &Value,
    helpers: &OperatorHelpers,
    retry: &RetryPerRecord,
    step_key: &StepKey,
    on_record_error: Option<&dyn OnRecordError>,
) -> Vec<Record> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let mut attempt: u32 = 0;
        loop {
            match operator.apply_one(record.clone(), args, helpers).await {
                Ok(Some(mapped)) => {
                    out.push(mapped);
                    break;
                }
                Ok(None) => break,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < retry.max_retries && retry.is_retryable(&message) {
                        tokio::time::sleep(Duration::from_millis(retry.delay_ms(attempt))).await;
                        attempt += 1;
                        continue;
                    }
                    if let Some(cb) = on_record_error {
                        cb.on_record_error(step_key, &message, &record);
                    }
                    break;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn executes_single_operator_by_adapter_code() {
        let registry = OperatorRegistry::new();
        let helpers = OperatorHelpers::new(None);
        let step_key = StepKey::new("t1").unwrap();
        let mut record = Record::new();
        record.insert("path".into(), json!(1));
        let config = json!({"adapterCode": "set", "path": "flag", "value": true});
        let out = TransformExecutor::execute_operator(&step_key, &config, vec![record], &registry, &helpers, None)
            .await
            .unwrap();
        assert_eq!(out[0].get("flag"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn executes_operator_chain_in_order() {
        let registry = OperatorRegistry::new();
        let helpers = OperatorHelpers::new(None);
        let step_key = StepKey::new("t1").unwrap();
        let record = Record::new();
        let config = json!({"operators": [
            {"op": "set", "args": {"path": "a", "value": 1}},
            {"op": "set", "args": {"path": "b", "value": 2}}
        ]});
        let out = TransformExecutor::execute_operator(&step_key, &config, vec![record], &registry, &helpers, None)
            .await
            .unwrap();
        assert_eq!(out[0].get("a"), Some(&json!(1)));
        assert_eq!(out[0].get("b"), Some(&json!(2)));
    }

    #[test]
    fn validate_drops_failing_records_in_collect_mode() {
        let step_key = StepKey::new("v1").unwrap();
        let config = json!({"fields": {"email": {"required": true}}});
        let record = Record::new();
        let out = TransformExecutor::execute_validate(&step_key, &config, vec![record], &ErrorHandlingPolicy::default(), None).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn route_linear_returns_first_matching_branch() {
        let config = json!({"branches": [
            {"name": "eu", "when": [{"field": "region", "cmp": "eq", "value": "EU"}]}
        ]});
        let mut record = Record::new();
        record.insert("region".into(), json!("EU"));
        let out = TransformExecutor::execute_route(&config, vec![record]).unwrap();
        assert_eq!(out.len(), 1);
    }

    proptest! {
        /// Running a two-operator chain through `execute_operator` is the
        /// same as applying the second operator's args to the first
        /// operator's output directly.
        #[test]
        fn operator_chain_matches_sequential_application(
            value_a in any::<i32>(),
            value_b in any::<i32>(),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let registry = OperatorRegistry::new();
            let helpers = OperatorHelpers::new(None);
            let step_key = StepKey::new("chain").unwrap();
            let record = Record::new();

            let chained_config = json!({"operators": [
                {"op": "set", "args": {"path": "a", "value": value_a}},
                {"op": "set", "args": {"path": "b", "value": value_b}}
            ]});

            let chained = rt
                .block_on(TransformExecutor::execute_operator(
                    &step_key,
                    &chained_config,
                    vec![record.clone()],
                    &registry,
                    &helpers,
                    None,
                ))
                .unwrap();

            let op = registry.get("set", step_key.as_str()).unwrap();
            let after_a = rt.block_on(op.apply(vec![record], &json!({"path": "a", "value": value_a}), &helpers)).unwrap();
            let after_b = rt.block_on(op.apply(after_a, &json!({"path": "b", "value": value_b}), &helpers)).unwrap();

            prop_assert_eq!(chained[0].get("a"), after_b[0].get("a"));
            prop_assert_eq!(chained[0].get("b"), after_b[0].get("b"));
        }
    }
}

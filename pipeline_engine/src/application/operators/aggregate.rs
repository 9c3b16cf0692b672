// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `aggregate` — the one batch-native entry in the built-in catalog
//! (spec.md §4.2): groups records by a set of fields and reduces each
//! group to sum/avg/min/max/count.

use std::collections::BTreeMap;

use async_trait::async_trait;
use pipeline_domain::error::PipelineError;
use pipeline_domain::record::Record;
use pipeline_domain::repositories::operator::{Operator, OperatorHelpers};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregateArgs {
    group_by: Vec<String>,
    aggregations: Vec<Aggregation>,
}

#[derive(Debug, Deserialize)]
struct Aggregation {
    field: String,
    op: AggOp,
    #[serde(rename = "as")]
    alias: String,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum AggOp {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

/// `{ "groupBy": ["region"], "aggregations": [{"field": "amount", "op": "sum", "as": "total"}] }`.
pub struct AggregateOperator;

#[async_trait]
impl Operator for AggregateOperator {
    async fn apply(
        &self,
        records: Vec<Record>,
        args: &Value,
        helpers: &OperatorHelpers,
    ) -> Result<Vec<Record>, PipelineError> {
        let args: AggregateArgs =
            serde_json::from_value(args.clone()).map_err(|e| PipelineError::invalid_config(format!("invalid 'aggregate' args: {e}")))?;

        let mut groups: BTreeMap<Vec<String>, Vec<Record>> = BTreeMap::new();
        for record in records {
            let key: Vec<String> = args
                .group_by
                .iter()
                .map(|field| {
                    helpers
                        .get(&record, field)
                        .map(|v| match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .unwrap_or_default()
                })
                .collect();
            groups.entry(key).or_default().push(record);
        }

        let mut out = Vec::with_capacity(groups.len());
        for (key, group) in groups {
            let mut record = Record::new();
            for (field, value) in args.group_by.iter().zip(key.iter()) {
                record.insert(field.clone(), Value::String(value.clone()));
            }
            for agg in &args.aggregations {
                let values: Vec<f64> = group
                    .iter()
                    .filter_map(|r| helpers.get(r, &agg.field).and_then(Value::as_f64))
                    .collect();
                let result = match agg.op {
                    AggOp::Sum => values.iter().sum(),
                    AggOp::Avg => {
                        if values.is_empty() {
                            0.0
                        } else {
                            values.iter().sum::<f64>() / values.len() as f64
                        }
                    }
                    AggOp::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
                    AggOp::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                    AggOp::Count => group.len() as f64,
                };
                record.insert(agg.alias.clone(), serde_json::json!(result));
            }
            out.push(record);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn aggregates_sum_and_count_by_group() {
        let mut a = Record::new();
        a.insert("region".into(), json!("eu"));
        a.insert("amount".into(), json!(10.0));
        let mut b = Record::new();
        b.insert("region".into(), json!("eu"));
        b.insert("amount".into(), json!(20.0));
        let args = json!({
            "groupBy": ["region"],
            "aggregations": [
                {"field": "amount", "op": "sum", "as": "total"},
                {"field": "amount", "op": "count", "as": "n"}
            ]
        });
        let out = AggregateOperator.apply(vec![a, b], &args, &OperatorHelpers::new(None)).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("total"), Some(&json!(30.0)));
        assert_eq!(out[0].get("n"), Some(&json!(2.0)));
    }
}

// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Pure ROUTE-branch matching (spec.md §4.2). A record belongs to branch
//! *b* iff every condition in `b.when` matches; evaluation order is
//! declaration order and a record lands in the first matching branch.
//! Unmatched records fall into `"default"`.

use crate::record::{as_value, Record};
use crate::util::path;
use crate::value_objects::{RouteBranch, RouteCmp, RouteCondition};
use serde_json::Value;

pub const DEFAULT_BRANCH: &str = "default";

fn matches_condition(record_value: &Value, condition: &RouteCondition) -> bool {
    let field = path::get(record_value, &condition.field);
    match condition.cmp {
        RouteCmp::Exists => field.is_some() && !matches!(field, Some(Value::Null)),
        RouteCmp::IsNull => field.is_none() || matches!(field, Some(Value::Null)),
        _ => {
            let Some(field) = field else { return false };
            match condition.cmp {
                RouteCmp::Eq => field == &condition.value,
                RouteCmp::Ne => field != &condition.value,
                RouteCmp::Gt => compare_numbers(field, &condition.value).is_some_and(|o| o.is_gt()),
                RouteCmp::Lt => compare_numbers(field, &condition.value).is_some_and(|o| o.is_lt()),
                RouteCmp::Gte => compare_numbers(field, &condition.value).is_some_and(|o| !o.is_lt()),
                RouteCmp::Lte => compare_numbers(field, &condition.value).is_some_and(|o| !o.is_gt()),
                RouteCmp::In => condition.value.as_array().is_some_and(|arr| arr.contains(field)),
                RouteCmp::NotIn => !condition.value.as_array().is_some_and(|arr| arr.contains(field)),
                RouteCmp::Contains => as_str(field)
                    .zip(as_str(&condition.value))
                    .is_some_and(|(f, v)| f.contains(v)),
                RouteCmp::NotContains => !as_str(field)
                    .zip(as_str(&condition.value))
                    .is_some_and(|(f, v)| f.contains(v)),
                RouteCmp::StartsWith => as_str(field)
                    .zip(as_str(&condition.value))
                    .is_some_and(|(f, v)| f.starts_with(v)),
                RouteCmp::EndsWith => as_str(field)
                    .zip(as_str(&condition.value))
                    .is_some_and(|(f, v)| f.ends_with(v)),
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

fn compare_numbers(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

fn matches_branch(record_value: &Value, branch: &RouteBranch) -> bool {
    branch.when.iter().all(|c| matches_condition(record_value, c))
}

/// Returns the name of the first branch (in declaration order) whose `when`
/// clauses all match, or [`DEFAULT_BRANCH`] if none do.
pub fn first_matching_branch<'a>(record: &Record, branches: &'a [RouteBranch]) -> &'a str {
    let wrapped = as_value(record);
    for branch in branches {
        if matches_branch(&wrapped, branch) {
            return branch.name.as_str();
        }
    }
    DEFAULT_BRANCH
}

/// Graph-mode partition: every input record is assigned to exactly one
/// branch name (its first match, or `"default"`).
pub fn partition_into_branches(
    records: Vec<Record>,
    branches: &[RouteBranch],
) -> std::collections::BTreeMap<String, Vec<Record>> {
    let mut out: std::collections::BTreeMap<String, Vec<Record>> = std::collections::BTreeMap::new();
    for record in records {
        let branch = first_matching_branch(&record, branches).to_string();
        out.entry(branch).or_default().push(record);
    }
    out
}

/// Linear-mode semantics: the records of the first branch with at least one
/// match, or `[]` if no branch matched anything.
pub fn first_branch_with_any_match(records: Vec<Record>, branches: &[RouteBranch]) -> Vec<Record> {
    let partitioned = partition_into_branches(records, branches);
    for branch in branches {
        if let Some(matched) = partitioned.get(&branch.name) {
            if !matched.is_empty() {
                return matched.clone();
            }
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_with(field: &str, value: Value) -> Record {
        let mut record = Record::new();
        record.insert(field.to_string(), value);
        record
    }

    #[test]
    fn partitions_records_by_first_match() {
        let branches = vec![
            RouteBranch {
                name: "eu".into(),
                when: vec![RouteCondition {
                    field: "region".into(),
                    cmp: RouteCmp::Eq,
                    value: json!("EU"),
                }],
            },
            RouteBranch {
                name: "na".into(),
                when: vec![RouteCondition {
                    field: "region".into(),
                    cmp: RouteCmp::In,
                    value: json!(["US", "CA"]),
                }],
            },
        ];
        let records = vec![
            record_with("region", json!("EU")),
            record_with("region", json!("US")),
            record_with("region", json!("CA")),
        ];
        let partitioned = partition_into_branches(records, &branches);
        assert_eq!(partitioned.get("eu").unwrap().len(), 1);
        assert_eq!(partitioned.get("na").unwrap().len(), 2);
        assert!(partitioned.get(DEFAULT_BRANCH).is_none());
    }

    #[test]
    fn unmatched_records_fall_to_default() {
        let branches = vec![RouteBranch {
            name: "eu".into(),
            when: vec![RouteCondition {
                field: "region".into(),
                cmp: RouteCmp::Eq,
                value: json!("EU"),
            }],
        }];
        let partitioned = partition_into_branches(vec![record_with("region", json!("US"))], &branches);
        assert_eq!(partitioned.get(DEFAULT_BRANCH).unwrap().len(), 1);
    }

    #[test]
    fn linear_mode_returns_first_branch_with_a_match() {
        let branches = vec![
            RouteBranch {
                name: "eu".into(),
                when: vec![RouteCondition {
                    field: "region".into(),
                    cmp: RouteCmp::Eq,
                    value: json!("EU"),
                }],
            },
            RouteBranch {
                name: "na".into(),
                when: vec![RouteCondition {
                    field: "region".into(),
                    cmp: RouteCmp::Eq,
                    value: json!("US"),
                }],
            },
        ];
        let records = vec![record_with("region", json!("US"))];
        let result = first_branch_with_any_match(records, &branches);
        assert_eq!(result.len(), 1);
    }
}

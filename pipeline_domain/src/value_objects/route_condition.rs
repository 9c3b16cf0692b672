// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `RouteCondition` / `RouteBranch` — a ROUTE step's branch predicates
//! (spec.md §4.2).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `branches: [{name, when: [RouteCondition]}]`. A record belongs to a
/// branch iff every condition in `when` matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteBranch {
    pub name: String,
    #[serde(default)]
    pub when: Vec<RouteCondition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteCondition {
    pub field: String,
    pub cmp: RouteCmp,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteCmp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    In,
    NotIn,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
    Exists,
    IsNull,
}

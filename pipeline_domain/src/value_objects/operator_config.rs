// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `OperatorConfig` — one entry of a TRANSFORM/ENRICH step's operator chain.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ op: registryCode, args: JSON }` (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorConfig {
    pub op: String,
    #[serde(default)]
    pub args: Value,
}

impl OperatorConfig {
    pub fn new(op: impl Into<String>, args: Value) -> Self {
        Self { op: op.into(), args }
    }
}

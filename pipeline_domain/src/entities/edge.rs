// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `Edge` — a directed link between two steps in graph-mode pipelines
//! (spec.md §3).

use crate::value_objects::StepKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: StepKey,
    pub to: StepKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl Edge {
    pub fn new(from: StepKey, to: StepKey) -> Self {
        Self { from, to, branch: None }
    }

    pub fn on_branch(from: StepKey, to: StepKey, branch: impl Into<String>) -> Self {
        Self {
            from,
            to,
            branch: Some(branch.into()),
        }
    }
}

// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `CheckpointData` and `ExecutorContext` (spec.md §3, §4.5).
//!
//! Each step owns exactly one sub-map of `CheckpointData`, keyed by its own
//! `StepKey`. The contract that a step only reads/writes its own sub-map is
//! enforced by convention (handlers are given `&mut ExecutorContext` and are
//! trusted to index by their own key), not by the type system.

use crate::value_objects::{CheckpointingPolicy, ErrorHandlingPolicy, StepKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `map<stepKey, map<string, JsonValue>>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointData(pub BTreeMap<String, BTreeMap<String, Value>>);

impl CheckpointData {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn sub_map(&self, step_key: &StepKey) -> Option<&BTreeMap<String, Value>> {
        self.0.get(step_key.as_str())
    }

    pub fn set_sub_map(&mut self, step_key: &StepKey, data: BTreeMap<String, Value>) {
        self.0.insert(step_key.as_str().to_string(), data);
    }
}

/// Per-run in-flight state threaded through every step invocation.
pub struct ExecutorContext {
    pub cp_data: Option<CheckpointData>,
    cp_dirty: bool,
    pub error_handling: ErrorHandlingPolicy,
    pub checkpointing: CheckpointingPolicy,
}

impl ExecutorContext {
    pub fn new(error_handling: ErrorHandlingPolicy, checkpointing: CheckpointingPolicy) -> Self {
        Self {
            cp_data: None,
            cp_dirty: false,
            error_handling,
            checkpointing,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.cp_dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.cp_dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_dirty_is_idempotent() {
        let mut ctx = ExecutorContext::new(ErrorHandlingPolicy::default(), CheckpointingPolicy::default());
        assert!(!ctx.is_dirty());
        ctx.mark_dirty();
        ctx.mark_dirty();
        assert!(ctx.is_dirty());
    }

    #[test]
    fn sub_map_round_trip() {
        let mut cp = CheckpointData::empty();
        let key = StepKey::new("extract").unwrap();
        let mut sub = BTreeMap::new();
        sub.insert("cursor".to_string(), Value::from(42));
        cp.set_sub_map(&key, sub);
        assert_eq!(cp.sub_map(&key).unwrap().get("cursor"), Some(&Value::from(42)));
    }
}

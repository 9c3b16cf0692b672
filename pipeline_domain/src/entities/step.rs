// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `Step` and `StepType` (spec.md §3). `config` is left as a raw JSON value
//! on the entity; each executor parses only the shape it expects, so a
//! malformed config for one step type never fails parsing of the whole
//! definition — it surfaces as a `ConfigError` the first time that step
//! runs.

use crate::value_objects::{StepKey, ThroughputConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepType {
    Trigger,
    Extract,
    Transform,
    Enrich,
    Validate,
    Route,
    Load,
    Export,
    Feed,
    Sink,
    Gate,
}

impl StepType {
    /// LOAD/EXPORT/FEED/SINK emit no records downstream (spec.md §3, §6).
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepType::Load | StepType::Export | StepType::Feed | StepType::Sink)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub key: StepKey,
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default)]
    pub config: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<ThroughputConfig>,
}

impl Step {
    pub fn new(key: StepKey, name: impl Into<String>, step_type: StepType, config: Value) -> Self {
        Self {
            key,
            name: name.into(),
            step_type,
            config,
            throughput: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_types() {
        assert!(StepType::Load.is_terminal());
        assert!(StepType::Sink.is_terminal());
        assert!(!StepType::Transform.is_terminal());
        assert!(!StepType::Gate.is_terminal());
    }
}

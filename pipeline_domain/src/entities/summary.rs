// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `Summary` (scheduler run result) and `ExecutionResult` (a terminal
//! step's ok/fail tally), per spec.md §3, §6.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub ok: u64,
    pub fail: u64,
}

impl ExecutionResult {
    pub fn new(ok: u64, fail: u64) -> Self {
        Self { ok, fail }
    }

    pub fn combine(self, other: ExecutionResult) -> ExecutionResult {
        ExecutionResult {
            ok: self.ok + other.ok,
            fail: self.fail + other.fail,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(default, rename = "pausedAtStep", skip_serializing_if = "Option::is_none")]
    pub paused_at_step: Option<String>,
}

impl Summary {
    pub fn record_result(&mut self, result: ExecutionResult) {
        self.processed += result.ok + result.fail;
        self.succeeded += result.ok;
        self.failed += result.fail;
    }

    pub fn paused_at(step_key: impl Into<String>) -> PartialSummaryBuilder {
        PartialSummaryBuilder {
            summary: Summary {
                paused: Some(true),
                paused_at_step: Some(step_key.into()),
                ..Default::default()
            },
        }
    }
}

/// Small builder so `paused_at(..)` reads naturally at call sites that then
/// fill in the accumulated counters.
pub struct PartialSummaryBuilder {
    summary: Summary,
}

impl PartialSummaryBuilder {
    pub fn with_counts(mut self, processed: u64, succeeded: u64, failed: u64) -> Summary {
        self.summary.processed = processed;
        self.summary.succeeded = succeeded;
        self.summary.failed = failed;
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_result_accumulates() {
        let mut summary = Summary::default();
        summary.record_result(ExecutionResult::new(3, 1));
        summary.record_result(ExecutionResult::new(2, 0));
        assert_eq!(summary.processed, 6);
        assert_eq!(summary.succeeded, 5);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn paused_builder_sets_flags() {
        let summary = Summary::paused_at("gate1").with_counts(5, 5, 0);
        assert_eq!(summary.paused, Some(true));
        assert_eq!(summary.paused_at_step.as_deref(), Some("gate1"));
        assert_eq!(summary.processed, 5);
    }
}

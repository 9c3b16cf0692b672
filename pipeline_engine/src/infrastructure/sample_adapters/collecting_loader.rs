// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `CollectingLoader` — a `Loader` that appends every record it receives to
//! an in-process buffer and logs a one-line summary per call. A sample
//! adapter for tests/examples, not one of the entity-specific handlers
//! spec.md §1 places out of scope.

use std::sync::Mutex;

use async_trait::async_trait;
use pipeline_domain::entities::{ExecutionResult, Step};
use pipeline_domain::error::PipelineError;
use pipeline_domain::record::{as_value, Record};
use pipeline_domain::repositories::loader::Loader;
use pipeline_domain::value_objects::ErrorHandlingPolicy;
use serde_json::{json, Value};
use tracing::info;

#[derive(Default)]
pub struct CollectingLoader {
    collected: Mutex<Vec<Record>>,
}

impl CollectingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collected(&self) -> Vec<Record> {
        self.collected.lock().unwrap().clone()
    }
}

#[async_trait]
impl Loader for CollectingLoader {
    fn adapter_code(&self) -> &str {
        "collect"
    }

    async fn execute(
        &self,
        step: &Step,
        records: Vec<Record>,
        _error_handling: &ErrorHandlingPolicy,
    ) -> Result<ExecutionResult, PipelineError> {
        let count = records.len() as u64;
        info!(step_key = %step.key, count, "collecting loader received records");
        self.collected.lock().unwrap().extend(records);
        Ok(ExecutionResult::new(count, 0))
    }

    async fn simulate(&self, step: &Step, records: &[Record]) -> Option<Value> {
        Some(json!({
            "step": step.key.to_string(),
            "wouldLoad": records.len(),
            "preview": records.iter().take(3).map(as_value).collect::<Vec<_>>(),
        }))
    }
}

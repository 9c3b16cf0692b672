// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `Loader` — the port a LOAD/EXPORT/FEED/SINK step dispatches to, wrapped
//! by the throughput controller (spec.md §4.3, §4.4, §6).

use crate::entities::{ExecutionResult, Step};
use crate::error::PipelineError;
use crate::record::Record;
use crate::value_objects::ErrorHandlingPolicy;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Loader: Send + Sync {
    fn adapter_code(&self) -> &str;

    async fn execute(
        &self,
        step: &Step,
        records: Vec<Record>,
        error_handling: &ErrorHandlingPolicy,
    ) -> Result<ExecutionResult, PipelineError>;

    /// Non-destructive preview for the dry-run simulator (spec.md §4.6).
    /// `None` means this loader has no simulation and dry-run skips it.
    async fn simulate(&self, _step: &Step, _records: &[Record]) -> Option<Value> {
        None
    }
}

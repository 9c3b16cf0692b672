// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Callback contracts consumed by the scheduler and its executors
//! (spec.md §6).

use crate::record::Record;
use crate::value_objects::StepKey;

/// Invoked by executors and the VALIDATE step for every record that fails
/// locally; never fatal on its own.
pub trait OnRecordError: Send + Sync {
    fn on_record_error(&self, step_key: &StepKey, message: &str, record: &Record);
}

impl<F: Fn(&StepKey, &str, &Record) + Send + Sync> OnRecordError for F {
    fn on_record_error(&self, step_key: &StepKey, message: &str, record: &Record) {
        self(step_key, message, record)
    }
}

/// Polled by the scheduler between steps (linear) and between ready pops
/// (graph). Cooperative: a `true` result does not interrupt an in-flight
/// step.
pub trait OnCancelRequested: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

impl<F: Fn() -> bool + Send + Sync> OnCancelRequested for F {
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// Optional observability hooks. All methods default to no-ops so callers
/// implement only the ones they care about.
pub trait StepLogCallback: Send + Sync {
    fn on_step_start(&self, _step_key: &StepKey) {}
    fn on_step_complete(&self, _step_key: &StepKey, _processed: usize) {}
    fn on_step_failed(&self, _step_key: &StepKey, _message: &str) {}
    fn on_extract_data(&self, _step_key: &StepKey, _count: usize) {}
    fn on_load_data(&self, _step_key: &StepKey, _ok: u64, _fail: u64) {}
    fn on_transform_mapping(&self, _step_key: &StepKey, _before: &Record, _after: &Record) {}
}

/// A `StepLogCallback` that observes nothing; the scheduler's default when
/// a caller supplies none.
pub struct NoOpStepLog;

impl StepLogCallback for NoOpStepLog {}

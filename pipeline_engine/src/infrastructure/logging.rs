// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Structured logging setup, and a `StepLogCallback` that forwards into
//! `tracing` so a run is observable even when the caller wires nothing else
//! up (spec.md §6's `StepLogCallback`, teacher's `infrastructure::logging`).

use pipeline_domain::record::Record;
use pipeline_domain::repositories::callbacks::StepLogCallback;
use pipeline_domain::value_objects::StepKey;
use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber. Level defaults to `info` and is
/// overridable via `RUST_LOG`. Safe to call once per process; a second call
/// is a no-op (the underlying `set_global_default` error is swallowed, same
/// as the teacher's init routine).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// A `StepLogCallback` that emits `tracing` events instead of forwarding
/// anywhere else. Used as the scheduler's default when the caller doesn't
/// supply its own callback, so a run stays observable through logs alone.
pub struct TracingStepLog;

impl StepLogCallback for TracingStepLog {
    fn on_step_start(&self, step_key: &StepKey) {
        tracing::info!(step_key = %step_key, "step started");
    }

    fn on_step_complete(&self, step_key: &StepKey, processed: usize) {
        tracing::info!(step_key = %step_key, processed, "step completed");
    }

    fn on_step_failed(&self, step_key: &StepKey, message: &str) {
        tracing::warn!(step_key = %step_key, error = message, "step failed");
    }

    fn on_extract_data(&self, step_key: &StepKey, count: usize) {
        tracing::debug!(step_key = %step_key, count, "extracted records");
    }

    fn on_load_data(&self, step_key: &StepKey, ok: u64, fail: u64) {
        tracing::debug!(step_key = %step_key, ok, fail, "loaded records");
    }

    fn on_transform_mapping(&self, step_key: &StepKey, before: &Record, after: &Record) {
        tracing::trace!(step_key = %step_key, ?before, ?after, "record transformed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_step_log_does_not_panic() {
        let log = TracingStepLog;
        log.on_step_start(&StepKey::new("s1").unwrap());
        log.on_step_complete(&StepKey::new("s1").unwrap(), 3);
    }
}

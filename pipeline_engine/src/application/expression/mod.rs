// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The safe expression evaluator (spec.md §4.7): a whitelisted, sandboxed
//! subset of JS-like expressions used by the `script` operator and by
//! `when`/route conditions that opt into expressions instead of the
//! structured comparison form.
//!
//! Compilation is cached (see [`cache`]); evaluation runs with a hard
//! wall-clock timeout enforced by a watchdog thread, since the tree-walking
//! evaluator here has no cooperative yield points to interrupt.

pub mod ast;
pub mod cache;
pub mod evaluator;
pub mod parser;

use std::sync::mpsc;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use cache::ScriptCache;

static SCRIPT_CACHE: Lazy<ScriptCache> = Lazy::new(ScriptCache::default);

/// The outcome of evaluating a single expression against a context.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub success: bool,
    pub value: Option<Value>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl EvaluationResult {
    fn ok(value: Value, elapsed: Duration) -> Self {
        Self {
            success: true,
            value: Some(value),
            error: None,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    fn err(message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(message.into()),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Compiles (or reuses the cached compile of) `expression` and evaluates it
/// against `context`, enforcing `timeout_ms` via a watchdog thread.
pub fn evaluate(expression: &str, context: &Map<String, Value>, timeout_ms: u64) -> EvaluationResult {
    evaluate_with_mode(expression, context, timeout_ms, true)
}

/// As [`evaluate`], but honors `scriptOperatorsEnabled` directly: when
/// `enabled` is `false`, every call returns the disabled-mode error without
/// compiling anything, per spec.md §4.7.
pub fn evaluate_with_mode(expression: &str, context: &Map<String, Value>, timeout_ms: u64, enabled: bool) -> EvaluationResult {
    let start = Instant::now();
    if !enabled {
        return EvaluationResult::err("Script operators are disabled", start.elapsed());
    }
    let expr = match SCRIPT_CACHE.get_or_compile(expression, context) {
        Ok(expr) => expr,
        Err(message) => return EvaluationResult::err(message, start.elapsed()),
    };

    let context = context.clone();
    let (tx, rx) = mpsc::channel();
    let handle = std::thread::spawn(move || {
        let result = evaluator::eval(&expr, &context);
        // The receiver may already have timed out and dropped; ignore.
        let _ = tx.send(result);
    });

    match rx.recv_timeout(Duration::from_millis(timeout_ms.max(1))) {
        Ok(Ok(value)) => {
            let _ = handle.join();
            EvaluationResult::ok(value, start.elapsed())
        }
        Ok(Err(message)) => {
            let _ = handle.join();
            EvaluationResult::err(message, start.elapsed())
        }
        Err(_) => EvaluationResult::err(format!("Expression timeout after {timeout_ms}ms"), start.elapsed()),
    }
}

/// Clears the process-wide compiled-script cache. Exposed for tests and for
/// operators that want to reclaim memory after a large batch.
pub fn clear_cache() {
    SCRIPT_CACHE.clear();
}

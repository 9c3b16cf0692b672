// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A hierarchical error type for the pipeline runtime, organized around the
//! taxonomy the runtime's design calls for: configuration errors are fatal to
//! a run, record errors are recovered locally and counted, checkpoint errors
//! degrade gracefully, and cancellation unwinds cleanly.
//!
//! ## Error categories
//!
//! - **Config** — malformed step config (e.g. a missing `adapterCode`),
//!   invalid expression, cyclic graph, duplicate step key. Fatal to the run.
//!   An `adapterCode` present but unregistered is not a `Config` error: the
//!   scheduler logs a warning and degrades gracefully instead (spec.md
//!   §4.3) — empty output for EXTRACT, all-input-failed for LOAD/EXPORT/
//!   FEED/SINK.
//! - **Record** — a single record failed transform/validate/load. Reported via
//!   `OnRecordError`, counted in `failed`, never fatal unless the pipeline's
//!   error-handling mode is `FailFast`.
//! - **Handler** — a handler (extractor/loader/operator) panicked or returned
//!   an unrecoverable error. All records in the affected chunk count as
//!   failed; the scheduler continues unless `FailFast`.
//! - **Checkpoint** — load/save against the `CheckpointStore` failed. Logged,
//!   not fatal.
//! - **Cancelled** — cooperative cancellation took effect.
//! - **Evaluator** — expression compile/validate/timeout failure. Surfaces as
//!   a `Record` error when raised from inside an operator.

use thiserror::Error;

/// Errors raised by the pipeline domain and application layers.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("duplicate step key: {0}")]
    DuplicateStepKey(String),

    #[error("unknown step reference: {0}")]
    UnknownStepReference(String),

    #[error("cyclic pipeline graph detected at step {0}")]
    CyclicGraph(String),

    #[error("[{step_key}] operator not found: {code}")]
    OperatorNotFound { step_key: String, code: String },

    #[error("[{step_key}] {message}")]
    RecordError { step_key: String, message: String },

    #[error("[{step_key}] handler failed: {message}")]
    HandlerError { step_key: String, message: String },

    #[error("checkpoint error: {0}")]
    CheckpointError(String),

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("expression error: {0}")]
    EvaluatorError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("io error: {0}")]
    IoError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl PipelineError {
    /// Creates a configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a record-level error scoped to a step.
    pub fn record(step_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordError {
            step_key: step_key.into(),
            message: message.into(),
        }
    }

    /// Creates a handler-level error scoped to a step.
    pub fn handler(step_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HandlerError {
            step_key: step_key.into(),
            message: message.into(),
        }
    }

    /// True for errors that must abort the run (`ConfigError`/`Cancelled` per
    /// spec.md §7's propagation policy).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidConfiguration(_)
                | PipelineError::DuplicateStepKey(_)
                | PipelineError::UnknownStepReference(_)
                | PipelineError::CyclicGraph(_)
                | PipelineError::OperatorNotFound { .. }
                | PipelineError::Cancelled(_)
        )
    }

    /// Category label, used for metrics and log fields.
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::InvalidConfiguration(_) => "configuration",
            PipelineError::DuplicateStepKey(_) => "configuration",
            PipelineError::UnknownStepReference(_) => "configuration",
            PipelineError::CyclicGraph(_) => "configuration",
            PipelineError::OperatorNotFound { .. } => "configuration",
            PipelineError::RecordError { .. } => "record",
            PipelineError::HandlerError { .. } => "handler",
            PipelineError::CheckpointError(_) => "checkpoint",
            PipelineError::Cancelled(_) => "cancellation",
            PipelineError::EvaluatorError(_) => "evaluator",
            PipelineError::SerializationError(_) => "serialization",
            PipelineError::IoError(_) => "io",
            PipelineError::InternalError(_) => "internal",
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

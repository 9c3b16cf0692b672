// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Management
//!
//! Standardized Unix exit codes (BSD `sysexits.h` conventions), mapped from
//! `pipeline_domain::error::PipelineError`'s category rather than from
//! sniffing an error's `Display` text.

use pipeline_domain::error::PipelineError;
use std::fmt;

/// Exit codes following Unix conventions (BSD sysexits.h).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    #[default]
    Success = 0,
    Error = 1,
    /// Invalid CLI arguments (64).
    UsageError = 64,
    /// Malformed pipeline definition / invalid step config (65).
    DataError = 65,
    /// Input file not found or unreadable (66).
    NoInput = 66,
    /// A record/handler error was reported, but the run still finished (70).
    Software = 70,
    /// Checkpoint store failure (74).
    IoError = 74,
    /// Pipeline validation failed: duplicate keys, unknown edges, cycles (78).
    Config = 78,
    /// Cooperative cancellation took effect (130, matches SIGINT).
    Interrupted = 130,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps a `PipelineError`'s category (spec.md §7) to an exit code.
    pub fn from_pipeline_error(error: &PipelineError) -> Self {
        match error {
            PipelineError::InvalidConfiguration(_)
            | PipelineError::DuplicateStepKey(_)
            | PipelineError::UnknownStepReference(_)
            | PipelineError::CyclicGraph(_)
            | PipelineError::OperatorNotFound { .. } => ExitCode::Config,
            PipelineError::RecordError { .. } | PipelineError::HandlerError { .. } => ExitCode::Software,
            PipelineError::CheckpointError(_) | PipelineError::IoError(_) => ExitCode::IoError,
            PipelineError::Cancelled(_) => ExitCode::Interrupted,
            PipelineError::EvaluatorError(_) => ExitCode::Software,
            PipelineError::SerializationError(_) => ExitCode::DataError,
            PipelineError::InternalError(_) => ExitCode::Error,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::Software => "A step reported a record or handler error",
            ExitCode::IoError => "I/O or checkpoint store error",
            ExitCode::Config => "Pipeline definition failed validation",
            ExitCode::Interrupted => "Interrupted by signal (SIGINT)",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_config_exit_code() {
        assert_eq!(ExitCode::from_pipeline_error(&PipelineError::invalid_config("bad")), ExitCode::Config);
        assert_eq!(ExitCode::from_pipeline_error(&PipelineError::CyclicGraph("a".into())), ExitCode::Config);
    }

    #[test]
    fn record_errors_map_to_software() {
        assert_eq!(ExitCode::from_pipeline_error(&PipelineError::record("s1", "bad record")), ExitCode::Software);
    }

    #[test]
    fn checkpoint_errors_map_to_io() {
        assert_eq!(ExitCode::from_pipeline_error(&PipelineError::CheckpointError("disk full".into())), ExitCode::IoError);
    }

    #[test]
    fn default_is_success() {
        assert_eq!(ExitCode::default(), ExitCode::Success);
        assert!(ExitCode::Success.is_success());
    }
}

// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Secure Command-Line Argument Parsing
//!
//! Security-first validation of arguments clap has already parsed.
//!
//! Dangerous patterns detected: `..` (path traversal), `~` (home
//! expansion), `$` (variable expansion), backticks (command
//! substitution), `;` `&` `|` (command chaining), `>` `<` (redirection),
//! null bytes, newlines, carriage returns.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum single argument length.
const MAX_ARG_LENGTH: usize = 1000;

/// Maximum path length.
const MAX_PATH_LENGTH: usize = 4096;

/// Dangerous patterns that indicate potential attacks.
const DANGEROUS_PATTERNS: &[&str] = &[
    "..", "~", "$", "`", ";", "&", "|", ">", "<", "\n", "\r", "\0",
];

/// Protected system directories.
const PROTECTED_DIRS: &[&str] = &["/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev"];

/// Errors from security-validating a parsed argument.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("argument too long (max {MAX_ARG_LENGTH} characters): {0}")]
    ArgumentTooLong(String),

    #[error("dangerous pattern detected in argument: {pattern} in {arg}")]
    DangerousPattern { pattern: String, arg: String },

    #[error("path exceeds maximum length (max {MAX_PATH_LENGTH})")]
    PathTooLong,

    #[error("access to protected system directory denied: {0}")]
    ProtectedDirectory(String),

    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid argument value for {arg}: {reason}")]
    InvalidValue { arg: String, reason: String },

    #[error("step key is empty")]
    EmptyStepKey,
}

/// Security-first argument validator.
pub struct SecureArgParser;

impl SecureArgParser {
    /// Validates a single argument for security issues.
    pub fn validate_argument(arg: &str) -> Result<(), ParseError> {
        if arg.len() > MAX_ARG_LENGTH {
            return Err(ParseError::ArgumentTooLong(arg.chars().take(50).collect::<String>() + "..."));
        }

        for pattern in DANGEROUS_PATTERNS {
            if arg.contains(pattern) {
                return Err(ParseError::DangerousPattern {
                    pattern: pattern.to_string(),
                    arg: arg.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Validates and canonicalizes a file path.
    pub fn validate_path(path: &str) -> Result<PathBuf, ParseError> {
        Self::validate_argument(path).map_err(|e| match e {
            ParseError::ArgumentTooLong(_) => ParseError::InvalidPath(format!("path too long: {path}")),
            ParseError::DangerousPattern { pattern, .. } => {
                ParseError::InvalidPath(format!("path contains dangerous pattern '{pattern}': {path}"))
            }
            other => other,
        })?;

        let path_obj = Path::new(path);

        let canonical = path_obj.canonicalize().map_err(|e| {
            if !path_obj.exists() {
                ParseError::PathNotFound(path.to_string())
            } else {
                ParseError::InvalidPath(format!("{path}: {e}"))
            }
        })?;

        if canonical.to_string_lossy().len() > MAX_PATH_LENGTH {
            return Err(ParseError::PathTooLong);
        }

        for protected in PROTECTED_DIRS {
            if canonical.starts_with(protected) {
                return Err(ParseError::ProtectedDirectory(canonical.display().to_string()));
            }
        }

        Ok(canonical)
    }

    /// Validates an optional path; `None` passes through untouched.
    pub fn validate_optional_path(path: Option<&str>) -> Result<Option<PathBuf>, ParseError> {
        match path {
            Some(p) => Self::validate_path(p).map(Some),
            None => Ok(None),
        }
    }

    /// Validates a step key argument: non-empty and free of dangerous patterns.
    pub fn validate_step_key(arg: &str) -> Result<String, ParseError> {
        if arg.is_empty() {
            return Err(ParseError::EmptyStepKey);
        }
        Self::validate_argument(arg)?;
        Ok(arg.to_string())
    }

    /// Validates a ULID-shaped pipeline id argument.
    pub fn validate_pipeline_id(arg: &str) -> Result<String, ParseError> {
        Self::validate_argument(arg)?;
        if arg.len() != 26 || !arg.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ParseError::InvalidValue {
                arg: "pipeline_id".to_string(),
                reason: format!("not a 26-character ULID: {arg}"),
            });
        }
        Ok(arg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod argument_validation {
        use super::*;

        #[test]
        fn accepts_safe_arguments() {
            assert!(SecureArgParser::validate_argument("safe-arg").is_ok());
            assert!(SecureArgParser::validate_argument("pipeline.json").is_ok());
            assert!(SecureArgParser::validate_argument("path/to/file").is_ok());
        }

        #[test]
        fn rejects_too_long_arguments() {
            let long_arg = "a".repeat(MAX_ARG_LENGTH + 1);
            assert!(matches!(SecureArgParser::validate_argument(&long_arg), Err(ParseError::ArgumentTooLong(_))));
        }

        #[test]
        fn detects_dangerous_patterns() {
            let dangerous = vec![
                "../etc/passwd",
                "~/.ssh/id_rsa",
                "$(whoami)",
                "`ls`",
                "file;rm -rf /",
                "file&background",
                "file|pipe",
                "file>output",
                "file<input",
                "file\nwith\nnewlines",
            ];

            for arg in dangerous {
                assert!(
                    matches!(SecureArgParser::validate_argument(arg), Err(ParseError::DangerousPattern { .. })),
                    "failed to detect dangerous pattern in: {arg}"
                );
            }
        }
    }

    mod step_key_validation {
        use super::*;

        #[test]
        fn accepts_plain_step_keys() {
            assert_eq!(SecureArgParser::validate_step_key("extract_1").unwrap(), "extract_1");
        }

        #[test]
        fn rejects_empty_step_key() {
            assert!(matches!(SecureArgParser::validate_step_key(""), Err(ParseError::EmptyStepKey)));
        }
    }

    mod pipeline_id_validation {
        use super::*;

        #[test]
        fn rejects_wrong_length_ids() {
            assert!(matches!(
                SecureArgParser::validate_pipeline_id("too-short"),
                Err(ParseError::InvalidValue { .. })
            ));
        }

        #[test]
        fn accepts_ulid_shaped_ids() {
            let ulid = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
            assert_eq!(SecureArgParser::validate_pipeline_id(ulid).unwrap(), ulid);
        }
    }
}

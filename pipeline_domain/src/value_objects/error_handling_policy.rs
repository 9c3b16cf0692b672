// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ErrorHandlingPolicy` — run-wide and per-step error handling mode
//! (spec.md §4.2, §7).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorHandlingMode {
    FailFast,
    Collect,
}

impl Default for ErrorHandlingMode {
    fn default() -> Self {
        Self::Collect
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHandlingPolicy {
    #[serde(default, rename = "mode")]
    pub mode: ErrorHandlingMode,
}

impl ErrorHandlingPolicy {
    pub fn is_fail_fast(&self) -> bool {
        matches!(self.mode, ErrorHandlingMode::FailFast)
    }

    /// Retry step: substring filter on the retryable error message.
    pub fn retry(max_retries: u32, retry_delay_ms: u64, backoff: RetryBackoff) -> RetryPerRecord {
        RetryPerRecord {
            max_retries,
            retry_delay_ms,
            backoff,
            retryable_errors: Vec::new(),
        }
    }
}

/// `step.config.retryPerRecord` (spec.md §4.2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryPerRecord {
    #[serde(rename = "maxRetries")]
    pub max_retries: u32,
    #[serde(rename = "retryDelayMs")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub backoff: RetryBackoff,
    #[serde(default, rename = "retryableErrors")]
    pub retryable_errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RetryBackoff {
    Fixed,
    Exponential,
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self::Fixed
    }
}

impl RetryPerRecord {
    /// Whether `message` is eligible for retry under `retryableErrors`
    /// (empty list means "retry any error").
    pub fn is_retryable(&self, message: &str) -> bool {
        self.retryable_errors.is_empty()
            || self.retryable_errors.iter().any(|substr| message.contains(substr.as_str()))
    }

    /// Delay before attempt `attempt` (0-indexed), per spec.md §4.2.
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        match self.backoff {
            RetryBackoff::Fixed => self.retry_delay_ms * (attempt as u64 + 1),
            RetryBackoff::Exponential => self.retry_delay_ms * 2u64.saturating_pow(attempt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_backoff_scales_linearly() {
        let retry = RetryPerRecord {
            max_retries: 3,
            retry_delay_ms: 100,
            backoff: RetryBackoff::Fixed,
            retryable_errors: Vec::new(),
        };
        assert_eq!(retry.delay_ms(0), 100);
        assert_eq!(retry.delay_ms(2), 300);
    }

    #[test]
    fn exponential_backoff_doubles() {
        let retry = RetryPerRecord {
            max_retries: 3,
            retry_delay_ms: 100,
            backoff: RetryBackoff::Exponential,
            retryable_errors: Vec::new(),
        };
        assert_eq!(retry.delay_ms(0), 100);
        assert_eq!(retry.delay_ms(2), 400);
    }

    #[test]
    fn retryable_errors_filters_by_substring() {
        let retry = RetryPerRecord {
            max_retries: 1,
            retry_delay_ms: 10,
            backoff: RetryBackoff::Fixed,
            retryable_errors: vec!["timeout".into()],
        };
        assert!(retry.is_retryable("connection timeout after 5s"));
        assert!(!retry.is_retryable("not found"));
    }
}
